//! Per-path outcome aggregation

use crate::error::SubmoduleError;
use core::fmt;
use tracing::{error, info};

/// What happened to one submodule path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    Added,
    Cloned,
    AlreadyCloned,
    SkippedNotCloned,
    PatternsSaved,
    SparseCleared,
    SparseNotEnabled,
    PatternsApplied,
    SparseDisabled,
    SparseUnmanaged,
    Failed,
}

impl PathAction {
    /// Whether this outcome left the path untouched
    #[must_use]
    pub const fn is_skip(self) -> bool {
        matches!(
            self,
            Self::AlreadyCloned
                | Self::SkippedNotCloned
                | Self::SparseNotEnabled
                | Self::SparseUnmanaged
        )
    }
}

impl fmt::Display for PathAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match *self {
            Self::Added => "added",
            Self::Cloned => "cloned",
            Self::AlreadyCloned => "already cloned; skipped",
            Self::SkippedNotCloned => "not cloned; skipped",
            Self::PatternsSaved => "sparse patterns saved",
            Self::SparseCleared => "sparse checkout not enabled; cleared saved patterns",
            Self::SparseNotEnabled => "sparse checkout not enabled",
            Self::PatternsApplied => "sparse patterns applied",
            Self::SparseDisabled => "sparse checkout disabled",
            Self::SparseUnmanaged => "sparse checkout not managed; left untouched",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// One submodule path's result: the action taken, plus the error when a
/// later step failed (a clone that succeeded before sparse application
/// failed is a partial success, not a plain failure)
#[derive(Debug)]
pub struct PathOutcome {
    pub path: String,
    pub action: PathAction,
    pub error: Option<anyhow::Error>,
}

/// Aggregate result of one reconciliation operation
#[derive(Debug, Default)]
pub struct Report {
    outcomes: Vec<PathOutcome>,
}

impl Report {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fully successful path
    pub fn record<P: Into<String>>(&mut self, path: P, action: PathAction) {
        self.outcomes.push(PathOutcome {
            path: path.into(),
            action,
            error: None,
        });
    }

    /// Record a failed path
    pub fn record_failure<P: Into<String>>(&mut self, path: P, error: anyhow::Error) {
        self.outcomes.push(PathOutcome {
            path: path.into(),
            action: PathAction::Failed,
            error: Some(error),
        });
    }

    /// Record a path where an action completed but a later step failed
    pub fn record_partial<P: Into<String>>(
        &mut self,
        path: P,
        action: PathAction,
        error: anyhow::Error,
    ) {
        self.outcomes.push(PathOutcome {
            path: path.into(),
            action,
            error: Some(error),
        });
    }

    /// All per-path outcomes, in processing order
    #[must_use]
    pub fn outcomes(&self) -> &[PathOutcome] {
        &self.outcomes
    }

    /// Whether every targeted path reconciled without error
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    /// Log every outcome and a final summary line
    pub fn summarize(&self) {
        let mut processed = 0_usize;
        let mut skipped = 0_usize;
        let mut failed = 0_usize;

        for outcome in &self.outcomes {
            match outcome.error.as_ref() {
                Some(err) => {
                    failed += 1;
                    if outcome.action == PathAction::Failed {
                        error!("{}: {err:#}", outcome.path);
                    } else {
                        error!("{}: {}, then: {err:#}", outcome.path, outcome.action);
                    }
                }
                None => {
                    if outcome.action.is_skip() {
                        skipped += 1;
                    } else {
                        processed += 1;
                    }
                    info!("{}: {}", outcome.path, outcome.action);
                }
            }
        }

        info!("Reconciled {processed} submodule(s), skipped {skipped}, failed {failed}.");
    }

    /// Process exit code: 0 when clean; a single failure's own code when the
    /// operation targeted one path; 1 for multi-path partial failures
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            return 0;
        }
        if self.outcomes.len() == 1
            && let Some(err) = self.outcomes[0].error.as_ref()
            && let Some(submodule_err) = err.downcast_ref::<SubmoduleError>()
        {
            return submodule_err.exit_code();
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let mut report = Report::new();
        report.record("libs/a", PathAction::Cloned);
        report.record("libs/b", PathAction::AlreadyCloned);
        assert!(report.is_clean());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_multi_path_partial_failure_exits_one() {
        let mut report = Report::new();
        report.record("libs/a", PathAction::Cloned);
        report.record_failure(
            "libs/b",
            SubmoduleError::clone_failed("libs/b", "boom").into(),
        );
        assert!(!report.is_clean());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_single_path_failure_uses_error_exit_code() {
        let mut report = Report::new();
        report.record_failure(
            "libs/a",
            SubmoduleError::sparse_apply_failed("libs/a", "boom").into(),
        );
        assert_eq!(report.exit_code(), 4);
    }
}
