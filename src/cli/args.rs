use clap::{Parser, Subcommand};

/// Command-line arguments for git-partial-submodule
#[derive(Parser, Debug, Clone)]
#[command(name = "git-partial-submodule")]
#[command(about = "Add or clone partial git submodules; save and restore sparse-checkout patterns")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Display git commands without executing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: SubmoduleCommand,
}

/// The four reconciliation verbs
#[derive(Subcommand, Debug, Clone)]
pub enum SubmoduleCommand {
    /// Add a new partial submodule
    Add {
        /// Branch in the submodule repository to check out
        #[arg(short = 'b', long, value_name = "BRANCH")]
        branch: Option<String>,

        /// Logical name for the submodule (defaults to its path)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Enable sparse checkout in the submodule
        #[arg(long)]
        sparse: bool,

        /// URL of the git repository to be added as a submodule
        repository: String,

        /// Directory where the submodule will be checked out
        path: String,
    },

    /// Clone partial submodules from .gitmodules
    Clone {
        /// Submodule path(s) to clone (all submodules if unspecified)
        paths: Vec<String>,
    },

    /// Save sparse-checkout patterns to .gitmodules
    SaveSparse {
        /// Submodule path(s) to save (all submodules if unspecified)
        paths: Vec<String>,
    },

    /// Restore sparse-checkout patterns from .gitmodules
    RestoreSparse {
        /// Submodule path(s) to restore (all submodules if unspecified)
        paths: Vec<String>,
    },
}
