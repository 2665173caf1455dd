//! Command implementations for vault-cli

pub mod conflicts;
pub mod pull;
pub mod run;
pub mod track;

use std::path::PathBuf;
use std::sync::Arc;

use vault_core::{EngineContext, SyncSettings};
use vault_store::{FileSecretStore, JsonStore};

use crate::error::{CliError, Result};

pub use conflicts::{run_conflicts_list, run_conflicts_resolve};
pub use pull::run_pull;
pub use run::{run_daemon, run_poll, run_sync_path};
pub use track::run_add;

/// The default data directory: `<platform data dir>/syncvault`.
pub fn default_data_root() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("syncvault"))
        .ok_or_else(|| CliError::user("could not determine a data directory; pass --data-root"))
}

/// Build the engine context every command operates through.
pub fn open_context(data_root: PathBuf) -> Result<EngineContext> {
    std::fs::create_dir_all(&data_root)?;
    let store = Arc::new(JsonStore::open(&data_root)?);
    let secrets = Arc::new(FileSecretStore::new(data_root.join("secrets")));
    let settings = SyncSettings::load(&data_root);
    Ok(EngineContext::new(data_root, store, secrets, settings))
}
