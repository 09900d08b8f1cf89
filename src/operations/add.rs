//! The `add` operation: blobless-clone a new submodule and record it

use crate::error::SubmoduleError;
use crate::git::SubmoduleState;
use crate::manifest::SubmoduleRecord;
use crate::operations::{PathAction, Reconciler, Report};
use crate::sparse;
use anyhow::Result;
use tracing::info;

impl Reconciler<'_> {
    /// Add a new partial submodule: clone, optionally enable sparse checkout
    /// with the default patterns, then create the manifest record
    ///
    /// The manifest record is only written once every engine step has
    /// succeeded, so the manifest stays a record of fully reconciled
    /// intents. A clone left behind by a failed later step is reported and
    /// must be cleaned up before re-running.
    ///
    /// # Errors
    ///
    /// Returns `PathAlreadyManaged` if the path already has a record (before
    /// any engine call), or `CloneFailed`/`CheckoutFailed` when the engine
    /// refuses.
    pub fn add(
        &mut self,
        url: &str,
        path: &str,
        branch: Option<&str>,
        name: Option<&str>,
        sparse: bool,
    ) -> Result<Report> {
        if self.manifest.contains_path(path) {
            return Err(SubmoduleError::path_already_managed(path).into());
        }

        let name = name.unwrap_or(path);
        let state = SubmoduleState::snapshot(self.gateway, path, name)?;
        if state.module_dir_exists {
            return Err(SubmoduleError::clone_failed(
                path,
                format!("repository metadata for '{name}' already exists"),
            )
            .into());
        }
        if state.is_cloned {
            return Err(SubmoduleError::clone_failed(
                path,
                "already cloned but not recorded in .gitmodules",
            )
            .into());
        }
        if state.worktree_populated {
            return Err(SubmoduleError::clone_failed(
                path,
                "path exists but is not a valid checkout",
            )
            .into());
        }

        info!("Adding submodule '{path}' from {url}");
        self.gateway.clone_blobless(url, name, path, branch, sparse)?;
        self.gateway.checkout(path, branch)?;

        let mut report = Report::new();
        let patterns = if sparse {
            let defaults = sparse::default_patterns();
            if let Err(err) = self.gateway.write_sparse_patterns(path, &defaults) {
                report.record_partial(
                    path,
                    PathAction::Cloned,
                    err.context(
                        "cloned, but applying the default sparse patterns failed; \
                         no manifest record was created; clean up the clone and re-run add",
                    ),
                );
                return Ok(report);
            }
            Some(defaults)
        } else {
            None
        };

        let record = SubmoduleRecord::new(name, path, url)
            .with_branch(branch.map(str::to_owned))
            .with_sparse_patterns(patterns);
        self.manifest.create_record(&record)?;
        self.save_manifest()?;
        self.gateway
            .stage_paths(&[path.to_owned(), ".gitmodules".to_owned()])?;

        report.record(path, PathAction::Added);
        Ok(report)
    }
}
