//! The `restore-sparse` operation: manifest → working tree

use crate::git::SubmoduleState;
use crate::manifest::SubmoduleRecord;
use crate::operations::{PathAction, Reconciler, Report};
use crate::sparse;
use anyhow::Result;
use tracing::info;

impl Reconciler<'_> {
    /// Re-apply each targeted submodule's saved sparse patterns to its
    /// working tree
    ///
    /// A record with no saved patterns disables sparse checkout only when
    /// the submodule currently has it enabled: manifest silence means "not
    /// managed", never "must be plain".
    ///
    /// # Errors
    ///
    /// Returns an error for manifest-level failures; per-path failures land
    /// in the report.
    pub fn restore_sparse(&mut self, paths: &[String]) -> Result<Report> {
        let targets = self.resolve_targets(paths)?;

        let mut report = Report::new();
        for (path, target) in targets {
            match target {
                Err(err) => report.record_failure(path, err),
                Ok(record) => match self.restore_one(&record) {
                    Ok(action) => report.record(path, action),
                    Err(err) => report.record_failure(path, err),
                },
            }
        }
        Ok(report)
    }

    fn restore_one(&self, record: &SubmoduleRecord) -> Result<PathAction> {
        let state = SubmoduleState::snapshot(self.gateway, &record.path, &record.name)?;
        if !state.is_cloned {
            return Ok(PathAction::SkippedNotCloned);
        }

        match record.sparse_patterns.as_ref() {
            Some(patterns) => {
                self.gateway.write_sparse_patterns(&record.path, patterns)?;
                info!(
                    "Applied sparse-checkout patterns for '{}': {}",
                    record.path,
                    sparse::format_manifest_value(patterns)
                );
                Ok(PathAction::PatternsApplied)
            }
            None => {
                if state.active_patterns.is_some() {
                    self.gateway.disable_sparse(&record.path)?;
                    Ok(PathAction::SparseDisabled)
                } else {
                    Ok(PathAction::SparseUnmanaged)
                }
            }
        }
    }
}
