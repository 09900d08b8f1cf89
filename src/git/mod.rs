//! Git gateway module
//!
//! The sole interface to the underlying git engine. Every clone, checkout,
//! sparse-pattern application, and config read goes through the `VcsGateway`
//! trait as an atomic black-box operation; retry policy lives with the
//! callers, never here.

pub mod context;
pub mod mock;
pub mod real;
pub mod state;

pub use context::RepoContext;
pub use mock::MockGateway;
pub use real::{GitCli, check_git_availability, parse_git_version};
pub use state::SubmoduleState;

use anyhow::Result;

/// Narrow command/query surface over the git engine
///
/// Submodule paths are always worktree-root-relative with forward slashes,
/// exactly as they appear in `.gitmodules`.
///
/// # Implementations
/// - `GitCli`: production implementation shelling out to git
/// - `MockGateway`: in-memory test double
pub trait VcsGateway {
    /// Partial clone (`--filter=blob:none`) of `url` into the submodule
    /// worktree at `path`, repository metadata under the superproject's
    /// module directory for `name`. No checkout is performed.
    fn clone_blobless(
        &self,
        url: &str,
        name: &str,
        path: &str,
        branch: Option<&str>,
        sparse: bool,
    ) -> Result<()>;

    /// Check out `rev` in the submodule, or the clone's current branch when
    /// `rev` is `None`
    fn checkout(&self, path: &str, rev: Option<&str>) -> Result<()>;

    /// Advance the submodule's working tree to `commit` (detached), fetching
    /// from origin if the commit is not yet local
    fn fetch_and_checkout(&self, path: &str, commit: &str) -> Result<()>;

    /// The commit a local branch points at in the submodule, if the branch
    /// exists
    fn branch_head(&self, path: &str, branch: &str) -> Result<Option<String>>;

    /// Sparse patterns currently active in the submodule's working tree;
    /// `None` when sparse checkout is not enabled there
    fn read_sparse_patterns(&self, path: &str) -> Result<Option<Vec<String>>>;

    /// Enable non-cone sparse checkout with the given patterns and
    /// re-materialize the working tree
    fn write_sparse_patterns(&self, path: &str, patterns: &[String]) -> Result<()>;

    /// Disable sparse checkout, restoring the full working tree
    fn disable_sparse(&self, path: &str) -> Result<()>;

    /// The commit the superproject's HEAD tree records for `path` (the
    /// gitlink), if any
    fn gitlink_commit(&self, path: &str) -> Result<Option<String>>;

    /// The commit actually checked out in the submodule, `None` if uncloned
    fn checked_out_commit(&self, path: &str) -> Result<Option<String>>;

    /// Whether the submodule worktree has repository metadata attached
    fn is_cloned(&self, path: &str) -> bool;

    /// Whether the local clone carries a partial-clone filter
    fn is_partial_clone(&self, path: &str) -> Result<bool>;

    /// Whether the submodule worktree directory exists and is non-empty
    fn worktree_populated(&self, path: &str) -> bool;

    /// Whether repository metadata for `name` already exists under the
    /// superproject's module directory
    fn module_dir_exists(&self, name: &str) -> bool;

    /// `git submodule init` for the given paths (all submodules when empty)
    fn init_submodule_config(&self, paths: &[String]) -> Result<()>;

    /// Stage the given superproject paths (gitlinks and the manifest)
    fn stage_paths(&self, paths: &[String]) -> Result<()>;
}
