//! In-memory gateway implementation for testing

use crate::error::SubmoduleError;
use crate::git::VcsGateway;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// In-memory implementation of `VcsGateway` for unit tests
///
/// Holds a small model of each submodule (cloned, checked-out commit, active
/// sparse patterns) plus the superproject's gitlinks, and records every
/// mutating call so tests can assert on idempotence.
///
/// # Example
/// ```
/// use git_partial_submodule::git::{MockGateway, VcsGateway};
///
/// let gateway = MockGateway::new()
///     .with_gitlink("libs/foo", "abc123")
///     .with_cloned("libs/foo", "abc123");
///
/// assert!(gateway.is_cloned("libs/foo"));
/// assert!(gateway.mutations().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<RwLock<MockState>>,
}

#[derive(Default)]
struct MockState {
    submodules: HashMap<String, MockSubmodule>,
    gitlinks: HashMap<String, String>,
    module_dirs: HashSet<String>,
    fail_clone: HashSet<String>,
    fail_sparse: HashSet<String>,
    mutations: Vec<String>,
}

#[derive(Default, Clone)]
struct MockSubmodule {
    cloned: bool,
    partial: bool,
    head: Option<String>,
    branch_heads: HashMap<String, String>,
    active_patterns: Option<Vec<String>>,
    worktree_populated: bool,
}

impl MockGateway {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockState> {
        self.state.write().expect("mock state poisoned")
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockState> {
        self.state.read().expect("mock state poisoned")
    }

    /// Record a gitlink in the superproject tree (builder pattern)
    #[must_use]
    pub fn with_gitlink(self, path: &str, commit: &str) -> Self {
        self.write()
            .gitlinks
            .insert(path.to_owned(), commit.to_owned());
        self
    }

    /// Mark a submodule as already cloned at the given commit (builder)
    #[must_use]
    pub fn with_cloned(self, path: &str, head: &str) -> Self {
        {
            let mut state = self.write();
            let submodule = state.submodules.entry(path.to_owned()).or_default();
            submodule.cloned = true;
            submodule.partial = true;
            submodule.worktree_populated = true;
            submodule.head = Some(head.to_owned());
            state.module_dirs.insert(path.to_owned());
        }
        self
    }

    /// Set the active sparse patterns of a cloned submodule (builder)
    #[must_use]
    pub fn with_active_patterns(self, path: &str, patterns: &[&str]) -> Self {
        self.write()
            .submodules
            .entry(path.to_owned())
            .or_default()
            .active_patterns = Some(patterns.iter().map(|p| (*p).to_owned()).collect());
        self
    }

    /// Set a local branch head inside a submodule (builder)
    #[must_use]
    pub fn with_branch_head(self, path: &str, branch: &str, commit: &str) -> Self {
        self.write()
            .submodules
            .entry(path.to_owned())
            .or_default()
            .branch_heads
            .insert(branch.to_owned(), commit.to_owned());
        self
    }

    /// Leave a non-empty worktree with no repository metadata at `path`,
    /// the wreckage a failed clone can leave behind (builder)
    #[must_use]
    pub fn with_stray_worktree(self, path: &str) -> Self {
        self.write()
            .submodules
            .entry(path.to_owned())
            .or_default()
            .worktree_populated = true;
        self
    }

    /// Make `clone_blobless` fail for the given path (builder)
    #[must_use]
    pub fn with_failing_clone(self, path: &str) -> Self {
        self.write().fail_clone.insert(path.to_owned());
        self
    }

    /// Make `write_sparse_patterns` fail for the given path (builder)
    #[must_use]
    pub fn with_failing_sparse(self, path: &str) -> Self {
        self.write().fail_sparse.insert(path.to_owned());
        self
    }

    /// Every mutating call made so far, in order
    #[must_use]
    pub fn mutations(&self) -> Vec<String> {
        self.read().mutations.clone()
    }

    /// The sparse patterns currently active for a path
    #[must_use]
    pub fn active_patterns(&self, path: &str) -> Option<Vec<String>> {
        self.read()
            .submodules
            .get(path)
            .and_then(|s| s.active_patterns.clone())
    }

    /// The commit currently checked out for a path
    #[must_use]
    pub fn head(&self, path: &str) -> Option<String> {
        self.read().submodules.get(path).and_then(|s| s.head.clone())
    }
}

impl VcsGateway for MockGateway {
    fn clone_blobless(
        &self,
        url: &str,
        name: &str,
        path: &str,
        _branch: Option<&str>,
        sparse: bool,
    ) -> Result<()> {
        let mut state = self.write();
        state
            .mutations
            .push(format!("clone {path} {url} sparse={sparse}"));

        if state.fail_clone.contains(path) {
            // A failed clone is allowed to leave wreckage behind.
            state
                .submodules
                .entry(path.to_owned())
                .or_default()
                .worktree_populated = true;
            return Err(SubmoduleError::clone_failed(path, "mock clone failure").into());
        }

        state.module_dirs.insert(name.to_owned());
        let submodule = state.submodules.entry(path.to_owned()).or_default();
        submodule.cloned = true;
        submodule.partial = true;
        submodule.worktree_populated = true;
        Ok(())
    }

    fn checkout(&self, path: &str, rev: Option<&str>) -> Result<()> {
        let mut state = self.write();
        state
            .mutations
            .push(format!("checkout {path} {}", rev.unwrap_or("HEAD")));
        let head = rev.unwrap_or("default-head").to_owned();
        let resolved = state
            .submodules
            .get(path)
            .and_then(|s| s.branch_heads.get(&head).cloned())
            .unwrap_or(head);
        state.submodules.entry(path.to_owned()).or_default().head = Some(resolved);
        Ok(())
    }

    fn fetch_and_checkout(&self, path: &str, commit: &str) -> Result<()> {
        let mut state = self.write();
        state.mutations.push(format!("checkout-detach {path} {commit}"));
        state.submodules.entry(path.to_owned()).or_default().head = Some(commit.to_owned());
        Ok(())
    }

    fn branch_head(&self, path: &str, branch: &str) -> Result<Option<String>> {
        Ok(self
            .read()
            .submodules
            .get(path)
            .and_then(|s| s.branch_heads.get(branch).cloned()))
    }

    fn read_sparse_patterns(&self, path: &str) -> Result<Option<Vec<String>>> {
        Ok(self.active_patterns(path))
    }

    fn write_sparse_patterns(&self, path: &str, patterns: &[String]) -> Result<()> {
        let mut state = self.write();
        state
            .mutations
            .push(format!("sparse-set {path} {}", patterns.join(" ")));

        if state.fail_sparse.contains(path) {
            return Err(SubmoduleError::sparse_apply_failed(path, "mock sparse failure").into());
        }

        state
            .submodules
            .entry(path.to_owned())
            .or_default()
            .active_patterns = Some(patterns.to_vec());
        Ok(())
    }

    fn disable_sparse(&self, path: &str) -> Result<()> {
        let mut state = self.write();
        state.mutations.push(format!("sparse-disable {path}"));
        state
            .submodules
            .entry(path.to_owned())
            .or_default()
            .active_patterns = None;
        Ok(())
    }

    fn gitlink_commit(&self, path: &str) -> Result<Option<String>> {
        Ok(self.read().gitlinks.get(path).cloned())
    }

    fn checked_out_commit(&self, path: &str) -> Result<Option<String>> {
        Ok(self.head(path))
    }

    fn is_cloned(&self, path: &str) -> bool {
        self.read().submodules.get(path).is_some_and(|s| s.cloned)
    }

    fn is_partial_clone(&self, path: &str) -> Result<bool> {
        Ok(self.read().submodules.get(path).is_some_and(|s| s.partial))
    }

    fn worktree_populated(&self, path: &str) -> bool {
        self.read()
            .submodules
            .get(path)
            .is_some_and(|s| s.worktree_populated)
    }

    fn module_dir_exists(&self, name: &str) -> bool {
        self.read().module_dirs.contains(name)
    }

    fn init_submodule_config(&self, paths: &[String]) -> Result<()> {
        self.write()
            .mutations
            .push(format!("submodule-init {}", paths.join(" ")));
        Ok(())
    }

    fn stage_paths(&self, paths: &[String]) -> Result<()> {
        self.write().mutations.push(format!("add {}", paths.join(" ")));
        Ok(())
    }
}
