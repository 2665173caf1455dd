//! Shared setup for the end-to-end tests: a data root with a JSON state
//! store and a file-backed secret store, plus a developer work tree with a
//! tracked `.env` file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use vault_core::{EngineContext, SyncSettings};
use vault_store::{FileSecretStore, JsonStore, SecretBlob, SecretStore};

pub struct Harness {
    pub ctx: EngineContext,
    _data: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(SyncSettings::default())
    }

    /// Harness with engine timing tuned for the test at hand.
    pub fn with_settings(settings: SyncSettings) -> Self {
        let data = TempDir::new().unwrap();
        let secrets = Arc::new(FileSecretStore::new(data.path().join("secrets")));
        Self::with_secrets(data, secrets, settings)
    }

    /// Two harnesses sharing one secret store model two machines talking to
    /// the same remote service.
    pub fn sharing_secrets_of(other: &Harness) -> Self {
        let data = TempDir::new().unwrap();
        let secrets = Arc::new(FileSecretStore::new(
            other.ctx.data_root.join("secrets"),
        ));
        Self::with_secrets(data, secrets, SyncSettings::default())
    }

    fn with_secrets(data: TempDir, secrets: Arc<dyn SecretStore>, settings: SyncSettings) -> Self {
        let store = Arc::new(JsonStore::open(data.path()).unwrap());
        let ctx = EngineContext::new(data.path(), store, secrets, settings);
        Self { ctx, _data: data }
    }

    /// Hand out the context and the temp dir keeping it alive, for tests
    /// that construct a `SyncEngine` (which takes the context by value).
    pub fn into_parts(self) -> (EngineContext, TempDir) {
        (self.ctx, self._data)
    }
}

/// A git work tree containing one `.env` file.
pub struct Workspace {
    pub env_path: PathBuf,
    _dir: TempDir,
}

impl Workspace {
    pub fn with_env(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        vault_git::ensure_clone(dir.path(), None).unwrap();
        // Tracking canonicalizes paths; hand tests the canonical form so
        // store lookups by path match.
        let env_path = dir.path().canonicalize().unwrap().join(".env");
        std::fs::write(&env_path, content).unwrap();
        Self {
            env_path,
            _dir: dir,
        }
    }

    pub fn write_env(&self, content: &str) {
        std::fs::write(&self.env_path, content).unwrap();
    }

    pub fn read_env(&self) -> String {
        std::fs::read_to_string(&self.env_path).unwrap()
    }
}

pub fn blob(pairs: &[(&str, &str)]) -> SecretBlob {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The clone path of the (single) project in the store.
pub fn clone_path(ctx: &EngineContext) -> PathBuf {
    let projects = ctx.store.list_projects().unwrap();
    assert_eq!(projects.len(), 1);
    projects[0].local_clone_path.clone()
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
