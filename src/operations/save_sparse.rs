//! The `save-sparse` operation: working tree → manifest

use crate::git::SubmoduleState;
use crate::manifest::SubmoduleRecord;
use crate::operations::{PathAction, Reconciler, Report};
use crate::sparse;
use anyhow::Result;

impl Reconciler<'_> {
    /// Save each targeted submodule's active sparse patterns to its
    /// manifest record
    ///
    /// A submodule with sparse checkout disabled gets its saved value
    /// cleared; this is the only operation that ever removes a saved
    /// pattern list. Uncloned submodules are skipped, not cleared: a fresh
    /// checkout must not wipe saved patterns.
    ///
    /// # Errors
    ///
    /// Returns an error for manifest-level failures; per-path failures land
    /// in the report.
    pub fn save_sparse(&mut self, paths: &[String]) -> Result<Report> {
        let targets = self.resolve_targets(paths)?;

        let mut report = Report::new();
        for (path, target) in targets {
            match target {
                Err(err) => report.record_failure(path, err),
                Ok(record) => match self.save_one(&record) {
                    Ok(action) => report.record(path, action),
                    Err(err) => report.record_failure(path, err),
                },
            }
        }

        if self.manifest.is_modified() {
            self.save_manifest()?;
        }
        Ok(report)
    }

    fn save_one(&mut self, record: &SubmoduleRecord) -> Result<PathAction> {
        let state = SubmoduleState::snapshot(self.gateway, &record.path, &record.name)?;
        if !state.is_cloned {
            return Ok(PathAction::SkippedNotCloned);
        }

        match state.active_patterns {
            Some(patterns) => {
                sparse::validate(&record.path, &patterns)?;
                if record.sparse_patterns.as_ref() == Some(&patterns) {
                    return Ok(PathAction::PatternsSaved);
                }
                let updated = record.clone().with_sparse_patterns(Some(patterns));
                self.manifest.update_record(&updated)?;
                Ok(PathAction::PatternsSaved)
            }
            None => {
                if record.sparse_patterns.is_some() {
                    let updated = record.clone().with_sparse_patterns(None);
                    self.manifest.update_record(&updated)?;
                    Ok(PathAction::SparseCleared)
                } else {
                    Ok(PathAction::SparseNotEnabled)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockGateway;
    use crate::manifest::ManifestStore;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = "[submodule \"libs/alpha\"]\n\
\tpath = libs/alpha\n\
\turl = https://example.com/alpha.git\n\
\tsparse-checkout = /* !/*/\n\
[submodule \"libs/beta\"]\n\
\tpath = libs/beta\n\
\turl = https://example.com/beta.git\n";

    fn manifest_from(dir: &TempDir) -> ManifestStore {
        let path = dir.path().join(".gitmodules");
        fs::write(&path, MANIFEST).unwrap();
        ManifestStore::load(&path).unwrap()
    }

    #[test]
    fn test_save_records_active_patterns() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_cloned("libs/beta", "bbb222")
            .with_active_patterns("libs/beta", &["/src/", "/docs/"]);
        let mut reconciler = Reconciler::new(manifest_from(&dir), &gateway, false);

        let report = reconciler
            .save_sparse(&["libs/beta".to_owned()])
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.outcomes()[0].action, PathAction::PatternsSaved);

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert!(written.contains("\tsparse-checkout = /src/ /docs/\n"));
    }

    #[test]
    fn test_save_clears_patterns_when_sparse_disabled() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new().with_cloned("libs/alpha", "aaa111");
        let mut reconciler = Reconciler::new(manifest_from(&dir), &gateway, false);

        let report = reconciler
            .save_sparse(&["libs/alpha".to_owned()])
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.outcomes()[0].action, PathAction::SparseCleared);

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert!(!written.contains("sparse-checkout"));
    }

    #[test]
    fn test_save_without_saved_or_active_patterns_is_noop() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new().with_cloned("libs/beta", "bbb222");
        let mut reconciler = Reconciler::new(manifest_from(&dir), &gateway, false);

        let report = reconciler
            .save_sparse(&["libs/beta".to_owned()])
            .unwrap();
        assert_eq!(report.outcomes()[0].action, PathAction::SparseNotEnabled);

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert_eq!(written, MANIFEST);
    }

    #[test]
    fn test_save_skips_uncloned_submodule_without_clearing() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new();
        let mut reconciler = Reconciler::new(manifest_from(&dir), &gateway, false);

        let report = reconciler.save_sparse(&[]).unwrap();
        assert!(report.is_clean());
        assert!(
            report
                .outcomes()
                .iter()
                .all(|o| o.action == PathAction::SkippedNotCloned)
        );

        // Saved patterns survive a fresh checkout untouched.
        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert_eq!(written, MANIFEST);
    }

    #[test]
    fn test_save_rejects_patterns_with_embedded_whitespace() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_cloned("libs/beta", "bbb222")
            .with_active_patterns("libs/beta", &["/my docs/"]);
        let mut reconciler = Reconciler::new(manifest_from(&dir), &gateway, false);

        let report = reconciler
            .save_sparse(&["libs/beta".to_owned()])
            .unwrap();
        assert!(!report.is_clean());
        let err = report.outcomes()[0].error.as_ref().unwrap();
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_save_unchanged_patterns_does_not_rewrite_manifest() {
        let dir = TempDir::new().unwrap();
        let gateway = MockGateway::new()
            .with_cloned("libs/alpha", "aaa111")
            .with_active_patterns("libs/alpha", &["/*", "!/*/"]);
        let mut reconciler = Reconciler::new(manifest_from(&dir), &gateway, false);

        let report = reconciler
            .save_sparse(&["libs/alpha".to_owned()])
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.outcomes()[0].action, PathAction::PatternsSaved);
        assert!(!reconciler.manifest.is_modified());
    }
}
