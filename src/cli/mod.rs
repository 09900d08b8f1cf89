//! Command-line interface module
//!
//! Handles argument parsing for the four reconciliation verbs

pub mod args;

pub use args::*;
