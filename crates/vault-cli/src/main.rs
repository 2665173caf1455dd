//! SyncVault CLI
//!
//! The command-line interface for tracking, pulling and synchronizing
//! secret-bearing env files.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConflictAction};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let data_root = match cli.data_root {
        Some(root) => root,
        None => commands::default_data_root()?,
    };

    match cli.command {
        Some(cmd) => execute_command(cmd, data_root),
        None => {
            println!("{} SyncVault", "syncvault".green().bold());
            println!();
            println!("Run {} for available commands.", "syncvault --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, data_root: std::path::PathBuf) -> Result<()> {
    let ctx = commands::open_context(data_root)?;
    match cmd {
        Commands::Add { path, keys } => commands::run_add(&ctx, &path, keys),
        Commands::Pull {
            owner,
            repo,
            clone_url,
            file_id,
            path,
        } => commands::run_pull(&ctx, owner, repo, clone_url, &file_id, &path),
        Commands::Run => commands::run_daemon(ctx),
        Commands::Poll => commands::run_poll(&ctx),
        Commands::Sync { path } => commands::run_sync_path(&ctx, &path),
        Commands::Conflicts { action } => match action {
            ConflictAction::List => commands::run_conflicts_list(&ctx),
            ConflictAction::Resolve { id, keep } => {
                commands::run_conflicts_resolve(&ctx, &id, &keep)
            }
        },
    }
}
