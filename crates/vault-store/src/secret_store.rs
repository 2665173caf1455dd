//! The secret-blob contract and its file-backed implementation
//!
//! A blob is one flat JSON object of key/value strings per project. Upserts
//! merge: only the keys present in the partial map are overwritten, other
//! keys in the blob survive, and a missing blob is created on first upsert.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SecretError;

/// One project's secret values.
pub type SecretBlob = BTreeMap<String, String>;

/// Remote secret storage, consumed as opaque get/upsert operations.
pub trait SecretStore: Send + Sync {
    /// Fetch the full blob. A blob that does not exist is
    /// [`SecretError::NotFound`].
    fn get_blob(&self, id: &str, region: Option<&str>) -> Result<SecretBlob, SecretError>;

    /// Merge `values` into the blob, creating it when absent. Keys not in
    /// `values` are preserved.
    fn upsert_blob(
        &self,
        id: &str,
        region: Option<&str>,
        values: &SecretBlob,
    ) -> Result<(), SecretError>;
}

/// Directory-of-JSON-files secret store.
///
/// Stands in for the remote service in local-only setups and in tests; the
/// cloud client implements the same trait out of tree.
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Blob ids may contain `/` (e.g. `syncvault/local/<id>`); flatten them
    /// into a single file name.
    fn blob_path(&self, id: &str) -> PathBuf {
        let sanitized = id.replace(['/', '\\'], "__");
        self.root.join(format!("{sanitized}.json"))
    }
}

impl SecretStore for FileSecretStore {
    fn get_blob(&self, id: &str, _region: Option<&str>) -> Result<SecretBlob, SecretError> {
        let path = self.blob_path(id);
        if !path.exists() {
            return Err(SecretError::NotFound { id: id.to_string() });
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| SecretError::Io {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SecretError::InvalidBlob {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    fn upsert_blob(
        &self,
        id: &str,
        region: Option<&str>,
        values: &SecretBlob,
    ) -> Result<(), SecretError> {
        let mut blob = match self.get_blob(id, region) {
            Ok(existing) => existing,
            // First upsert creates the blob
            Err(SecretError::NotFound { .. }) => SecretBlob::new(),
            Err(e) => return Err(e),
        };
        blob.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

        let raw = serde_json::to_string_pretty(&blob).map_err(|e| SecretError::InvalidBlob {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        vault_fs::write_atomic(&self.blob_path(id), raw.as_bytes()).map_err(|e| {
            SecretError::Io {
                id: id.to_string(),
                message: e.to_string(),
            }
        })?;
        debug!(id, keys = values.len(), "secret blob upserted");
        Ok(())
    }
}

impl FileSecretStore {
    /// Root directory holding the blob files.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
