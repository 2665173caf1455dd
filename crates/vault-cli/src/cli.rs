//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SyncVault - keep secret-bearing env files in sync
#[derive(Parser, Debug)]
#[command(name = "syncvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory (state, clones, conflict snapshots)
    #[arg(long, global = true, env = "SYNCVAULT_DATA_ROOT")]
    pub data_root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Track a local .env file
    ///
    /// Examples:
    ///   syncvault add .env
    ///   syncvault add config/.env.production -k DB_PASSWORD -k API_TOKEN
    Add {
        /// Path of the file to track
        path: PathBuf,

        /// Explicit secret keys; skips classification when given
        #[arg(short = 'k', long = "key")]
        keys: Vec<String>,
    },

    /// Pull a tracked file from a project repository onto this machine
    Pull {
        /// Repository owner
        #[arg(long)]
        owner: String,

        /// Repository name
        #[arg(long)]
        repo: String,

        /// Clone URL; defaults to the GitHub HTTPS URL for owner/repo
        #[arg(long)]
        clone_url: Option<String>,

        /// Id of the tracked file, as listed in the repository's mappings
        #[arg(long)]
        file_id: String,

        /// Where to write the hydrated file
        path: PathBuf,
    },

    /// Run the sync engine in the foreground until interrupted
    Run,

    /// Run one remote poll pass and exit
    Poll,

    /// Propagate one destination's local content now
    Sync {
        /// Path of the tracked destination
        path: PathBuf,
    },

    /// Inspect and resolve conflicts
    Conflicts {
        #[command(subcommand)]
        action: ConflictAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConflictAction {
    /// List open conflicts
    List,

    /// Resolve a conflict by keeping one side
    Resolve {
        /// Conflict id, as shown by `conflicts list`
        id: String,

        /// Which side to keep
        #[arg(long, value_parser = ["local", "remote"])]
        keep: String,
    },
}
