//! Persisted record types
//!
//! Shapes mirror the metadata rows the engine depends on: projects, tracked
//! files, destinations and conflicts. Hash fields always change together,
//! after the write they describe, never before.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current time as epoch milliseconds, the unit of `last_tool_write_at`.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time as an RFC 3339 string, used for audit fields.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A tracked source repository: one git work tree with one project clone and
/// one secret blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    /// Root of the developer's work tree the tracked files live in.
    pub local_repo_root: PathBuf,
    pub display_name: String,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_clone_url: Option<String>,
    /// The engine-owned clone templates and mappings are written to.
    pub local_clone_path: PathBuf,
    pub region: Option<String>,
    pub secret_id: Option<String>,
    pub poll_interval_seconds: u64,
    pub created_at: String,
}

/// Partial update for a project row.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
    pub github_clone_url: Option<String>,
    pub region: Option<String>,
    pub secret_id: Option<String>,
}

/// One tracked file within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub project_id: String,
    /// Path of the source file relative to the project root, POSIX style.
    pub source_relative_path: String,
    /// Template location inside the project clone.
    pub template_path: String,
    /// Mapping location inside the project clone.
    pub mapping_path: String,
    pub kind: String,
}

/// A concrete on-disk path bound to a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub id: String,
    pub file_id: String,
    pub path: PathBuf,
    /// Hash of the raw local content last seen by the engine.
    pub last_local_hash: Option<String>,
    /// Hash of the content the engine itself last rendered and wrote.
    pub last_render_hash: Option<String>,
    /// Epoch milliseconds of the engine's own last write to this path.
    /// Drives the watcher's loop suppression.
    pub last_tool_write_at: Option<i64>,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl DestinationRecord {
    pub fn new(file_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let now = now_rfc3339();
        Self {
            id: new_id(),
            file_id: file_id.into(),
            path: path.into(),
            last_local_hash: None,
            last_render_hash: None,
            last_tool_write_at: None,
            enabled: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Partial update for a destination row. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DestinationUpdate {
    pub last_local_hash: Option<String>,
    pub last_render_hash: Option<String>,
    pub last_tool_write_at: Option<i64>,
}

impl DestinationUpdate {
    /// Both hash fields plus the write stamp, as set after an engine render
    /// write.
    pub fn after_render_write(hash: &str, written_at: i64) -> Self {
        Self {
            last_local_hash: Some(hash.to_string()),
            last_render_hash: Some(hash.to_string()),
            last_tool_write_at: Some(written_at),
        }
    }
}

/// Conflict lifecycle status. Conflicts transition to resolved, never get
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStatus {
    Open,
    Resolved,
}

/// A detected both-sides-changed condition for one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub id: String,
    pub destination_id: String,
    pub detected_at: String,
    /// Snapshot of the on-disk content at detection time.
    pub local_copy_path: PathBuf,
    /// Snapshot of the freshly hydrated remote content at detection time.
    pub remote_copy_path: PathBuf,
    pub status: ConflictStatus,
}

impl ConflictRecord {
    pub fn open(
        destination_id: impl Into<String>,
        local_copy_path: impl Into<PathBuf>,
        remote_copy_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: new_id(),
            destination_id: destination_id.into(),
            detected_at: now_rfc3339(),
            local_copy_path: local_copy_path.into(),
            remote_copy_path: remote_copy_path.into(),
            status: ConflictStatus::Open,
        }
    }
}

/// Everything an operation on one destination needs, joined across the
/// destination, its file and its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationContext {
    pub destination_id: String,
    pub destination_path: PathBuf,
    pub last_local_hash: Option<String>,
    pub last_render_hash: Option<String>,
    pub last_tool_write_at: Option<i64>,
    pub file_id: String,
    pub template_path: String,
    pub mapping_path: String,
    pub project_id: String,
    pub local_clone_path: PathBuf,
    pub region: Option<String>,
    pub secret_id: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
}
