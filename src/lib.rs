//! `git-partial-submodule` - blobless, sparse-checkout submodule management
//!
//! This library keeps three independently-mutable stores in sync: the
//! superproject's `.gitmodules` manifest, each submodule's local repository
//! metadata, and each submodule's working-tree sparse-checkout state. The
//! four operations (`add`, `clone`, `save-sparse`, `restore-sparse`) are
//! idempotent reconciliations between those stores.

pub mod cli;
pub mod error;
pub mod git;
pub mod manifest;
pub mod operations;
pub mod sparse;

use anyhow::Result;
use cli::{Args, SubmoduleCommand};
use git::{GitCli, RepoContext, check_git_availability};
use manifest::ManifestStore;
use operations::Reconciler;

/// Main entry point for the library: run one reconciliation command and
/// return the process exit code
///
/// # Errors
///
/// Returns an error for fatal failures (git unavailable, not inside a
/// worktree, corrupt manifest, add preconditions). Per-path failures in
/// multi-path operations are reported and folded into the exit code
/// instead.
pub fn run(args: Args) -> Result<i32> {
    // Version 2.27.0 is needed for --filter and --sparse on git clone.
    check_git_availability()?;

    let ctx = RepoContext::discover()?;
    let manifest_path = ctx.manifest_path();
    let gateway = GitCli::new(ctx, args.dry_run);

    let report = match args.command {
        SubmoduleCommand::Add {
            branch,
            name,
            sparse,
            repository,
            path,
        } => {
            let manifest = ManifestStore::load_or_default(&manifest_path)?;
            let path = gateway.context().relativize(&path)?;
            let mut reconciler = Reconciler::new(manifest, &gateway, args.dry_run);
            reconciler.add(
                &repository,
                &path,
                branch.as_deref(),
                name.as_deref(),
                sparse,
            )?
        }
        SubmoduleCommand::Clone { paths } => {
            let manifest = ManifestStore::load(&manifest_path)?;
            let paths = relativize_all(&gateway, &paths)?;
            let mut reconciler = Reconciler::new(manifest, &gateway, args.dry_run);
            reconciler.clone_missing(&paths)?
        }
        SubmoduleCommand::SaveSparse { paths } => {
            let manifest = ManifestStore::load(&manifest_path)?;
            let paths = relativize_all(&gateway, &paths)?;
            let mut reconciler = Reconciler::new(manifest, &gateway, args.dry_run);
            reconciler.save_sparse(&paths)?
        }
        SubmoduleCommand::RestoreSparse { paths } => {
            let manifest = ManifestStore::load(&manifest_path)?;
            let paths = relativize_all(&gateway, &paths)?;
            let mut reconciler = Reconciler::new(manifest, &gateway, args.dry_run);
            reconciler.restore_sparse(&paths)?
        }
    };

    report.summarize();
    Ok(report.exit_code())
}

/// Convert user-supplied submodule paths to the worktree-relative form used
/// as manifest keys
fn relativize_all(gateway: &GitCli, paths: &[String]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|p| gateway.context().relativize(p))
        .collect()
}
