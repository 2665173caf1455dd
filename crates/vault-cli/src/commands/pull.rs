//! `syncvault pull`

use std::path::Path;

use colored::Colorize;

use vault_core::{EngineContext, RemoteSource, pull_file};

use crate::error::Result;

pub fn run_pull(
    ctx: &EngineContext,
    owner: String,
    repo: String,
    clone_url: Option<String>,
    file_id: &str,
    path: &Path,
) -> Result<()> {
    let clone_url =
        clone_url.unwrap_or_else(|| format!("https://github.com/{owner}/{repo}.git"));
    let source = RemoteSource {
        owner,
        repo,
        clone_url,
    };

    let result = pull_file(ctx, &source, file_id, path)?;

    println!("{} {}", "pulled".green().bold(), result.destination_path.display());
    println!("  project: {}", result.project_id);
    if !result.missing_keys.is_empty() {
        println!(
            "{} no secret values for: {}",
            "warning".yellow().bold(),
            result.missing_keys.join(", ")
        );
    }
    Ok(())
}
