//! Ephemeral per-submodule state snapshot

use crate::git::VcsGateway;
use anyhow::Result;

/// Live state of one submodule path, composed from gateway queries
///
/// Always computed fresh and discarded after the operation that needed it:
/// external actors (manual git commands, another process) may mutate any of
/// these stores between invocations, so caching would lie.
#[derive(Debug, Clone)]
pub struct SubmoduleState {
    /// Repository metadata is attached to the worktree
    pub is_cloned: bool,
    /// The commit the superproject's HEAD tree records for this path
    pub expected_commit: Option<String>,
    /// The commit actually checked out, `None` if uncloned
    pub checked_out_commit: Option<String>,
    /// The clone carries a partial-clone filter
    pub is_partial: bool,
    /// Patterns active in the working tree, `None` when sparse checkout is
    /// not enabled there
    pub active_patterns: Option<Vec<String>>,
    /// The worktree directory exists and is non-empty
    pub worktree_populated: bool,
    /// Repository metadata already exists under the superproject's module
    /// directory for this submodule's name
    pub module_dir_exists: bool,
}

impl SubmoduleState {
    /// Compose the gateway queries into one read-only view. Pure query, no
    /// side effects.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway query fails.
    pub fn snapshot(gateway: &dyn VcsGateway, path: &str, name: &str) -> Result<Self> {
        let is_cloned = gateway.is_cloned(path);

        Ok(Self {
            is_cloned,
            expected_commit: gateway.gitlink_commit(path)?,
            checked_out_commit: if is_cloned {
                gateway.checked_out_commit(path)?
            } else {
                None
            },
            is_partial: if is_cloned {
                gateway.is_partial_clone(path)?
            } else {
                false
            },
            active_patterns: if is_cloned {
                gateway.read_sparse_patterns(path)?
            } else {
                None
            },
            worktree_populated: gateway.worktree_populated(path),
            module_dir_exists: gateway.module_dir_exists(name),
        })
    }

    /// A failed or interrupted clone left files behind without attaching
    /// repository metadata; cloning into this would mask corruption.
    #[must_use]
    #[inline]
    pub const fn is_wreckage(&self) -> bool {
        !self.is_cloned && self.worktree_populated
    }
}
