//! Manifest module
//!
//! Owns the persisted `.gitmodules` manifest: record parsing, path-keyed
//! lookups, and atomic read-modify-write updates

pub mod record;
pub mod store;

pub use record::*;
pub use store::*;
