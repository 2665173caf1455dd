//! `syncvault run`, `syncvault poll` and `syncvault sync`

use std::path::Path;
use std::sync::mpsc;

use colored::Colorize;

use vault_core::{EngineContext, SyncEngine};

use crate::error::{CliError, Result};

/// Run the engine in the foreground until Ctrl-C.
pub fn run_daemon(ctx: EngineContext) -> Result<()> {
    let mut engine = SyncEngine::new(ctx);
    engine.start()?;
    println!("{} sync engine running, press Ctrl-C to stop", "syncvault".green().bold());

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| CliError::user(format!("could not install signal handler: {e}")))?;
    let _ = rx.recv();

    engine.stop();
    println!("{} stopped", "syncvault".green().bold());
    Ok(())
}

/// One poll pass, then exit.
pub fn run_poll(ctx: &EngineContext) -> Result<()> {
    vault_core::sync::poll::run_pass(ctx)?;
    println!("{} poll pass complete", "syncvault".green().bold());
    Ok(())
}

/// Propagate one destination now.
pub fn run_sync_path(ctx: &EngineContext, path: &Path) -> Result<()> {
    vault_core::sync::local::sync_local_now(ctx, path)?;
    println!("{} {}", "synced".green().bold(), path.display());
    Ok(())
}
