//! `syncvault add`

use std::path::Path;

use colored::Colorize;

use vault_core::{AddFileOptions, EngineContext, add_file};

use crate::error::Result;

pub fn run_add(ctx: &EngineContext, path: &Path, keys: Vec<String>) -> Result<()> {
    let options = AddFileOptions {
        secret_keys: if keys.is_empty() { None } else { Some(keys) },
    };
    let result = add_file(ctx, path, options)?;

    println!("{} {}", "tracked".green().bold(), path.display());
    println!("  project:  {}", result.project_id);
    println!("  file id:  {}", result.file_id);
    println!("  template: {}", result.template_path);
    if result.secret_keys.is_empty() {
        println!("  secrets:  none");
    } else {
        println!(
            "  secrets:  {}",
            result
                .secret_keys
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    for warning in &result.warnings {
        println!("{} {}", "warning".yellow().bold(), warning);
    }
    Ok(())
}
