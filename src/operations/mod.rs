//! Reconciliation operations
//!
//! The four verbs are each a finite sequence of idempotent steps driven by
//! comparing manifest records against live submodule state. Manifest-level
//! failures abort an operation before any engine mutation; per-path engine
//! failures are collected in the report and processing continues with the
//! remaining paths, in manifest order, with nothing shared between paths.

pub mod add;
pub mod clone;
pub mod report;
pub mod restore_sparse;
pub mod save_sparse;

pub use report::{PathAction, PathOutcome, Report};

use crate::git::VcsGateway;
use crate::manifest::{ManifestStore, SubmoduleRecord};
use anyhow::Result;
use tracing::info;

/// Drives the four reconciliation operations against a manifest store and a
/// git gateway
pub struct Reconciler<'g> {
    manifest: ManifestStore,
    gateway: &'g dyn VcsGateway,
    dry_run: bool,
}

impl<'g> Reconciler<'g> {
    #[must_use]
    #[inline]
    pub const fn new(manifest: ManifestStore, gateway: &'g dyn VcsGateway, dry_run: bool) -> Self {
        Self {
            manifest,
            gateway,
            dry_run,
        }
    }

    /// Resolve the requested paths against the manifest: all records in
    /// manifest order when no paths are given, otherwise one lookup per
    /// requested path with per-path `RecordNotFound` failures.
    fn resolve_targets(
        &self,
        paths: &[String],
    ) -> Result<Vec<(String, Result<SubmoduleRecord>)>> {
        if paths.is_empty() {
            Ok(self
                .manifest
                .records()?
                .into_iter()
                .map(|record| (record.path.clone(), Ok(record)))
                .collect())
        } else {
            Ok(paths
                .iter()
                .map(|path| (path.clone(), self.manifest.record_for_path(path)))
                .collect())
        }
    }

    fn save_manifest(&mut self) -> Result<()> {
        if self.dry_run {
            info!("dry run: not writing .gitmodules");
            return Ok(());
        }
        self.manifest.save()
    }
}
