//! File mappings
//!
//! A mapping is persisted in the project clone at
//! `syncvault/files/<fileId>.json` and binds a tracked file to its template
//! plus the key under which each secret value lives in the remote blob.
//! The blob key is normally identical to the local key but kept as an
//! explicit indirection.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where one local key's value is stored in the remote secret blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBinding {
    pub json_key: String,
}

/// Persisted binding between a tracked file, its template and its secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMapping {
    pub file_id: String,
    pub template_path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretBinding>,
}

impl FileMapping {
    /// Build a mapping where every secret key maps to itself in the blob.
    pub fn new(
        file_id: impl Into<String>,
        template_path: impl Into<String>,
        kind: impl Into<String>,
        secret_keys: &BTreeSet<String>,
    ) -> Self {
        let secrets = secret_keys
            .iter()
            .map(|key| {
                (
                    key.clone(),
                    SecretBinding {
                        json_key: key.clone(),
                    },
                )
            })
            .collect();
        Self {
            file_id: file_id.into(),
            template_path: template_path.into(),
            kind: kind.into(),
            secrets,
        }
    }

    /// Parse a mapping from its JSON text. `path` is only used for error
    /// context.
    pub fn from_json(path: &Path, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|source| Error::MappingParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize to the on-disk JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The set of local keys currently designated secret.
    pub fn secret_keys(&self) -> BTreeSet<String> {
        self.secrets.keys().cloned().collect()
    }

    /// Union newly discovered secret keys into the mapping, each bound to
    /// itself. Keys are only ever added, never removed. Returns whether the
    /// mapping grew.
    pub fn add_secret_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        let mut grew = false;
        for key in keys {
            if !self.secrets.contains_key(key) {
                self.secrets.insert(
                    key.to_string(),
                    SecretBinding {
                        json_key: key.to_string(),
                    },
                );
                grew = true;
            }
        }
        grew
    }

    /// Map a blob's values back onto local keys through the indirection.
    pub fn resolve_blob_values(
        &self,
        blob: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut resolved = BTreeMap::new();
        for (key, binding) in &self.secrets {
            if let Some(value) = blob.get(&binding.json_key) {
                resolved.insert(key.clone(), value.clone());
            }
        }
        resolved
    }
}
