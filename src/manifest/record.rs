//! Submodule record type

/// One submodule entry from the `.gitmodules` manifest
///
/// `path` is the primary lookup key; `name` is the `[submodule "<name>"]`
/// section key, which defaults to the path when a submodule is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleRecord {
    pub name: String,
    pub path: String,
    pub url: String,
    pub branch: Option<String>,
    /// Sparse-checkout patterns saved for this submodule, in working-tree
    /// order. `None` means sparse checkout is not managed for this path.
    pub sparse_patterns: Option<Vec<String>>,
}

impl SubmoduleRecord {
    /// Create a record for a newly added submodule
    #[must_use]
    #[inline]
    pub fn new<N, P, U>(name: N, path: P, url: U) -> Self
    where
        N: Into<String>,
        P: Into<String>,
        U: Into<String>,
    {
        Self {
            name: name.into(),
            path: path.into(),
            url: url.into(),
            branch: None,
            sparse_patterns: None,
        }
    }

    /// Set the tracked branch (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Set the sparse patterns (builder pattern)
    #[must_use]
    #[inline]
    pub fn with_sparse_patterns(mut self, patterns: Option<Vec<String>>) -> Self {
        self.sparse_patterns = patterns;
        self
    }
}
