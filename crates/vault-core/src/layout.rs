//! Project clone layout
//!
//! The on-disk shape of a SyncVault project clone:
//!
//! ```text
//! <clone>/templates/<relative-path>.template   rendered templates
//! <clone>/syncvault/files/<fileId>.json        file mappings
//! <clone>/syncvault/project.json               project identity metadata
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Directory holding rendered templates inside a clone.
pub const TEMPLATES_DIR: &str = "templates";

/// Directory holding file mappings inside a clone.
pub const FILES_DIR: &str = "syncvault/files";

/// Project identity metadata file inside a clone.
pub const PROJECT_META_FILE: &str = "syncvault/project.json";

/// Template path for a source file, relative to the clone root.
pub fn template_path_for(relative_posix: &str) -> String {
    format!("{TEMPLATES_DIR}/{relative_posix}.template")
}

/// Mapping path for a file id, relative to the clone root.
pub fn mapping_path_for(file_id: &str) -> String {
    format!("{FILES_DIR}/{file_id}.json")
}

/// Secret-store coordinates carried in the project metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSecretsMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
}

/// Identity metadata committed alongside the templates so that a fresh
/// machine pulling the repository can resolve the project and its blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<ProjectSecretsMetadata>,
}

impl ProjectMetadata {
    /// Load from a clone. Missing or corrupt metadata is `None`; the caller
    /// falls back to the project record.
    pub fn load(clone_path: &Path) -> Option<Self> {
        let path = clone_path.join(PROJECT_META_FILE);
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring corrupt project metadata");
                None
            }
        }
    }

    /// Where this metadata lives inside `clone_path`.
    pub fn path_in(clone_path: &Path) -> PathBuf {
        clone_path.join(PROJECT_META_FILE)
    }

    pub fn region(&self) -> Option<&str> {
        self.aws.as_ref().and_then(|a| a.region.as_deref())
    }

    pub fn secret_id(&self) -> Option<&str> {
        self.aws.as_ref().and_then(|a| a.secret_id.as_deref())
    }
}
