//! Shared engine context
//!
//! One [`EngineContext`] per process, owned by the [`SyncEngine`] and shared
//! with its worker threads. No component caches another component's state
//! across operations; everything re-reads the stores through this context.
//!
//! [`SyncEngine`]: crate::sync::engine::SyncEngine

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vault_store::{MetadataStore, SecretStore};

use crate::locks::DestinationLocks;
use crate::sync::settings::SyncSettings;

/// Everything a sync operation needs: stores, settings, locks and the data
/// root the engine keeps its clones, conflict snapshots and state under.
pub struct EngineContext {
    pub data_root: PathBuf,
    pub store: Arc<dyn MetadataStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub settings: SyncSettings,
    pub locks: DestinationLocks,
    /// Serializes full poller passes; a tick finding it held is skipped.
    pub pass_guard: Mutex<()>,
}

impl EngineContext {
    pub fn new(
        data_root: impl Into<PathBuf>,
        store: Arc<dyn MetadataStore>,
        secrets: Arc<dyn SecretStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            store,
            secrets,
            settings,
            locks: DestinationLocks::new(),
            pass_guard: Mutex::new(()),
        }
    }

    /// Where project clones live: `<data-root>/repos/<name>`.
    pub fn repos_dir(&self) -> PathBuf {
        self.data_root.join("repos")
    }

    /// Stable snapshot directory for one destination's conflict copies:
    /// `<data-root>/conflicts/<digest-of-path>`. Re-detecting the same
    /// conflict reuses the same directory, so no duplicate snapshots
    /// accumulate.
    pub fn conflict_dir(&self, destination_path: &Path) -> PathBuf {
        let digest = vault_fs::checksum::short_digest(&destination_path.to_string_lossy());
        self.data_root.join("conflicts").join(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vault_store::{FileSecretStore, JsonStore};

    #[test]
    fn conflict_dir_is_stable_per_destination() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        let secrets = Arc::new(FileSecretStore::new(dir.path().join("secrets")));
        let ctx = EngineContext::new(dir.path(), store, secrets, SyncSettings::default());

        let a = ctx.conflict_dir(Path::new("/home/dev/app/.env"));
        let b = ctx.conflict_dir(Path::new("/home/dev/app/.env"));
        let c = ctx.conflict_dir(Path::new("/home/dev/other/.env"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
