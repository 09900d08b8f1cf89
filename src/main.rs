//! # git-partial-submodule
//!
//! Add or clone partial ("blobless") git submodules, and save or restore
//! their sparse-checkout patterns through `.gitmodules`.
//!
//! ## Usage
//!
//! **Add a submodule with a blobless clone and sparse checkout:**
//! ```sh
//! git-partial-submodule add --sparse -b main https://github.com/user/lib.git libs/lib
//! ```
//!
//! **Materialize submodules after a fresh superproject checkout:**
//! ```sh
//! git-partial-submodule clone
//! ```
//!
//! **Persist or re-apply locally edited sparse patterns:**
//! ```sh
//! git-partial-submodule save-sparse libs/lib
//! git-partial-submodule restore-sparse
//! ```
//!
//! See `git-partial-submodule --help` for more options and details.

use anyhow::Result;
use clap::Parser as _;
use git_partial_submodule::cli::Args;
use git_partial_submodule::error::SubmoduleError;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber based on verbose flag
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    if args.dry_run {
        info!("DRY RUN:");
    }

    match git_partial_submodule::run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<SubmoduleError>()
                    .map_or(1, SubmoduleError::exit_code),
            );
        }
    }
}
