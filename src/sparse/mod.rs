//! Sparse-checkout pattern handling
//!
//! Serialization between the manifest and working-tree pattern representations

pub mod patterns;

pub use patterns::*;
