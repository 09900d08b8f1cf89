//! The `clone` operation: materialize manifest-listed submodules that are
//! missing after a fresh superproject checkout

use crate::error::SubmoduleError;
use crate::git::SubmoduleState;
use crate::manifest::SubmoduleRecord;
use crate::operations::{PathAction, Reconciler, Report};
use crate::sparse;
use anyhow::Result;
use tracing::{debug, info};

impl Reconciler<'_> {
    /// Clone every targeted submodule that has no local repository yet
    ///
    /// Already-initialized submodules are left completely untouched: a
    /// user's local pattern edits may be intentional and unsaved, so this
    /// never re-clones and never re-applies patterns.
    ///
    /// # Errors
    ///
    /// Returns an error for manifest-level failures; per-path engine
    /// failures land in the report instead.
    pub fn clone_missing(&mut self, paths: &[String]) -> Result<Report> {
        let targets = self.resolve_targets(paths)?;

        // Ensure submodule.<name> config entries exist before any clone.
        self.gateway.init_submodule_config(paths)?;

        let mut report = Report::new();
        for (path, target) in targets {
            match target {
                Err(err) => report.record_failure(path, err),
                Ok(record) => match self.clone_one(&record) {
                    Ok(action) => report.record(path, action),
                    Err(err) => report.record_failure(path, err),
                },
            }
        }
        Ok(report)
    }

    fn clone_one(&self, record: &SubmoduleRecord) -> Result<PathAction> {
        let state = SubmoduleState::snapshot(self.gateway, &record.path, &record.name)?;

        if state.is_cloned || state.module_dir_exists {
            debug!("submodule '{}' already cloned; skipping", record.path);
            return Ok(PathAction::AlreadyCloned);
        }
        if state.is_wreckage() {
            return Err(SubmoduleError::clone_failed(
                &record.path,
                "path exists but is not a valid checkout",
            )
            .into());
        }

        self.gateway.clone_blobless(
            &record.url,
            &record.name,
            &record.path,
            record.branch.as_deref(),
            record.sparse_patterns.is_some(),
        )?;

        if let Some(patterns) = record.sparse_patterns.as_ref() {
            self.gateway.write_sparse_patterns(&record.path, patterns)?;
            info!(
                "Applied sparse-checkout patterns for '{}': {}",
                record.path,
                sparse::format_manifest_value(patterns)
            );
        }

        match state.expected_commit.as_deref() {
            Some(expected) => {
                // Check out the branch rather than a detached head when the
                // branch head matches the gitlink.
                let mut branch_rev = None;
                if let Some(branch) = record.branch.as_deref()
                    && !self.dry_run
                    && self.gateway.branch_head(&record.path, branch)?.as_deref() == Some(expected)
                {
                    branch_rev = Some(branch);
                }
                match branch_rev {
                    Some(branch) => self.gateway.checkout(&record.path, Some(branch))?,
                    None => self.gateway.fetch_and_checkout(&record.path, expected)?,
                }
            }
            None => {
                // No gitlink committed yet for this path; stay on the
                // clone's branch or default head.
                self.gateway.checkout(&record.path, record.branch.as_deref())?;
            }
        }

        Ok(PathAction::Cloned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{MockGateway, VcsGateway as _};
    use crate::manifest::ManifestStore;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = "[submodule \"libs/alpha\"]\n\
\tpath = libs/alpha\n\
\turl = https://example.com/alpha.git\n\
\tbranch = main\n\
\tsparse-checkout = /* !/*/\n\
[submodule \"libs/beta\"]\n\
\tpath = libs/beta\n\
\turl = https://example.com/beta.git\n";

    fn manifest_from(dir: &TempDir, contents: &str) -> ManifestStore {
        let path = dir.path().join(".gitmodules");
        fs::write(&path, contents).unwrap();
        ManifestStore::load(&path).unwrap()
    }

    #[test]
    fn test_clone_materializes_all_missing_submodules() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_gitlink("libs/alpha", "aaa111")
            .with_gitlink("libs/beta", "bbb222");
        let mut reconciler = Reconciler::new(manifest_from(&dir, MANIFEST), &gateway, false);

        let report = reconciler.clone_missing(&[]).unwrap();
        assert!(report.is_clean());
        assert!(gateway.is_cloned("libs/alpha"));
        assert!(gateway.is_cloned("libs/beta"));
        assert_eq!(gateway.head("libs/alpha").as_deref(), Some("aaa111"));
        assert_eq!(
            gateway.active_patterns("libs/alpha"),
            Some(vec!["/*".to_owned(), "!/*/".to_owned()])
        );
        assert_eq!(gateway.active_patterns("libs/beta"), None);
    }

    #[test]
    fn test_clone_prefers_branch_when_head_matches_gitlink() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_gitlink("libs/alpha", "aaa111")
            .with_branch_head("libs/alpha", "main", "aaa111");
        let mut reconciler = Reconciler::new(manifest_from(&dir, MANIFEST), &gateway, false);

        let report = reconciler
            .clone_missing(&["libs/alpha".to_owned()])
            .unwrap();
        assert!(report.is_clean());
        assert!(
            gateway
                .mutations()
                .contains(&"checkout libs/alpha main".to_owned())
        );
    }

    #[test]
    fn test_clone_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_gitlink("libs/alpha", "aaa111")
            .with_gitlink("libs/beta", "bbb222");
        let mut reconciler = Reconciler::new(manifest_from(&dir, MANIFEST), &gateway, false);

        reconciler.clone_missing(&[]).unwrap();
        let first_run = gateway.mutations().len();

        let report = reconciler.clone_missing(&[]).unwrap();
        assert!(report.is_clean());
        assert!(
            report
                .outcomes()
                .iter()
                .all(|o| o.action == PathAction::AlreadyCloned)
        );

        // The second run re-runs only the idempotent config init, never a
        // clone, checkout, or pattern write.
        let second_run: Vec<String> = gateway.mutations().split_off(first_run);
        assert_eq!(second_run, vec!["submodule-init ".to_owned()]);
    }

    #[test]
    fn test_clone_partial_failure_continues_with_remaining_paths() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_gitlink("libs/alpha", "aaa111")
            .with_gitlink("libs/beta", "bbb222")
            .with_failing_clone("libs/alpha");
        let mut reconciler = Reconciler::new(manifest_from(&dir, MANIFEST), &gateway, false);

        let report = reconciler.clone_missing(&[]).unwrap();
        assert!(!report.is_clean());

        let failures: Vec<&str> = report
            .outcomes()
            .iter()
            .filter(|o| o.error.is_some())
            .map(|o| o.path.as_str())
            .collect();
        assert_eq!(failures, vec!["libs/alpha"]);
        assert!(gateway.is_cloned("libs/beta"));
    }

    #[test]
    fn test_clone_refuses_wreckage() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_gitlink("libs/alpha", "aaa111")
            .with_stray_worktree("libs/alpha");
        let mut reconciler = Reconciler::new(manifest_from(&dir, MANIFEST), &gateway, false);

        let report = reconciler
            .clone_missing(&["libs/alpha".to_owned()])
            .unwrap();
        assert!(!report.is_clean());
        let err = report.outcomes()[0].error.as_ref().unwrap();
        assert!(err.to_string().contains("not a valid checkout"));
    }

    #[test]
    fn test_clone_unknown_explicit_path_is_per_path_failure() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new().with_gitlink("libs/alpha", "aaa111");
        let mut reconciler = Reconciler::new(manifest_from(&dir, MANIFEST), &gateway, false);

        let report = reconciler
            .clone_missing(&["libs/alpha".to_owned(), "libs/nope".to_owned()])
            .unwrap();
        assert!(!report.is_clean());
        assert!(gateway.is_cloned("libs/alpha"));

        let failed: Vec<&str> = report
            .outcomes()
            .iter()
            .filter(|o| o.error.is_some())
            .map(|o| o.path.as_str())
            .collect();
        assert_eq!(failed, vec!["libs/nope"]);
    }
}
