//! `syncvault conflicts`

use colored::Colorize;

use vault_core::{EngineContext, resolve_keep_local, resolve_keep_remote};

use crate::error::{CliError, Result};

pub fn run_conflicts_list(ctx: &EngineContext) -> Result<()> {
    let conflicts = ctx.store.list_open_conflicts()?;
    if conflicts.is_empty() {
        println!("no open conflicts");
        return Ok(());
    }

    for conflict in conflicts {
        let path = ctx
            .store
            .find_destination_by_id(&conflict.destination_id)?
            .map(|d| d.path.display().to_string())
            .unwrap_or_else(|| "<destination missing>".to_string());
        println!("{} {}", conflict.id.red().bold(), path);
        println!("  detected: {}", conflict.detected_at);
        println!("  local:    {}", conflict.local_copy_path.display());
        println!("  remote:   {}", conflict.remote_copy_path.display());
    }
    Ok(())
}

pub fn run_conflicts_resolve(ctx: &EngineContext, id: &str, keep: &str) -> Result<()> {
    match keep {
        "local" => resolve_keep_local(ctx, id)?,
        "remote" => resolve_keep_remote(ctx, id)?,
        other => return Err(CliError::user(format!("unknown side: {other}"))),
    }
    println!("{} conflict {} keeping {}", "resolved".green().bold(), id, keep);
    Ok(())
}
