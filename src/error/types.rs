//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for submodule reconciliation operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SubmoduleError {
    /// Clone Error - partial clone refused or failed
    #[error("Clone failed for '{path}': {message}")]
    CloneFailed { path: String, message: String },

    /// Checkout Error - fetch or checkout could not complete
    #[error("Checkout failed for '{path}': {message}")]
    CheckoutFailed { path: String, message: String },

    /// Sparse Error - sparse-checkout enable/set/disable failed
    #[error("Sparse checkout failed for '{path}': {message}")]
    SparseApplyFailed { path: String, message: String },

    /// Manifest Error - .gitmodules unreadable or unparsable
    #[error("Manifest error: {message}")]
    ManifestCorrupt { message: String },

    /// Record Error - no manifest record for the given path
    #[error("No submodule record for '{path}' in .gitmodules")]
    RecordNotFound { path: String },

    /// Add Error - path already has a manifest record
    #[error("Submodule path '{path}' is already managed in .gitmodules")]
    PathAlreadyManaged { path: String },

    /// Pattern Error - sparse pattern cannot be stored in the manifest
    #[error("Invalid sparse pattern '{pattern}' for '{path}': {message}")]
    InvalidPattern {
        path: String,
        pattern: String,
        message: String,
    },

    /// Git Error - engine plumbing failed outside any one submodule
    #[error("Git error: {message}")]
    Git { message: String },
}

impl SubmoduleError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::CloneFailed { .. } => 2,
            Self::CheckoutFailed { .. } => 3,
            Self::SparseApplyFailed { .. } => 4,
            Self::ManifestCorrupt { .. } => 5,
            Self::RecordNotFound { .. } => 6,
            Self::PathAlreadyManaged { .. } => 7,
            Self::InvalidPattern { .. } => 8,
            Self::Git { .. } => 9,
        }
    }

    /// Create a clone error
    #[inline]
    pub fn clone_failed<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::CloneFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a checkout error
    #[inline]
    pub fn checkout_failed<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::CheckoutFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a sparse-checkout error
    #[inline]
    pub fn sparse_apply_failed<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::SparseApplyFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a manifest error
    #[inline]
    pub fn manifest_corrupt<S: Into<String>>(message: S) -> Self {
        Self::ManifestCorrupt {
            message: message.into(),
        }
    }

    /// Create a record-not-found error
    #[inline]
    pub fn record_not_found<P: Into<String>>(path: P) -> Self {
        Self::RecordNotFound { path: path.into() }
    }

    /// Create an already-managed error
    #[inline]
    pub fn path_already_managed<P: Into<String>>(path: P) -> Self {
        Self::PathAlreadyManaged { path: path.into() }
    }

    /// Create an invalid-pattern error
    #[inline]
    pub fn invalid_pattern<P: Into<String>, Q: Into<String>, S: Into<String>>(
        path: P,
        pattern: Q,
        message: S,
    ) -> Self {
        Self::InvalidPattern {
            path: path.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a git plumbing error
    #[inline]
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git {
            message: message.into(),
        }
    }
}
