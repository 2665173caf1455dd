//! JSON-file-backed [`MetadataStore`]
//!
//! All records live in one state file under the data root, written
//! atomically after every mutation. Reads go through the interior mutex so
//! a read-decide-write against this store is consistent per call; the
//! engine's per-destination locks serialize anything longer.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::records::{
    ConflictRecord, ConflictStatus, DestinationContext, DestinationRecord, DestinationUpdate,
    FileRecord, ProjectRecord, ProjectUpdate, now_rfc3339,
};
use crate::store::MetadataStore;
use crate::{Error, Result};

const STATE_FILE: &str = "state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    projects: Vec<ProjectRecord>,
    #[serde(default)]
    files: Vec<FileRecord>,
    #[serde(default)]
    destinations: Vec<DestinationRecord>,
    #[serde(default)]
    conflicts: Vec<ConflictRecord>,
}

/// Metadata store persisted as a single JSON state file.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl JsonStore {
    /// Open (or create) the state file under `data_root`.
    pub fn open(data_root: &Path) -> Result<Self> {
        let path = data_root.join(STATE_FILE);
        let state = if path.exists() {
            let raw = vault_fs::read_text(&path)?;
            serde_json::from_str(&raw).map_err(|source| Error::StateParse {
                path: path.clone(),
                source,
            })?
        } else {
            State::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn save(&self, state: &State) -> Result<()> {
        let raw = serde_json::to_string_pretty(state)?;
        vault_fs::write_atomic(&self.path, raw.as_bytes())?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    fn with_state<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let state = self.state.lock().expect("state mutex poisoned");
        f(&state)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        let out = f(&mut state)?;
        self.save(&state)?;
        Ok(out)
    }

    fn context_for(state: &State, destination: &DestinationRecord) -> Option<DestinationContext> {
        let file = state.files.iter().find(|f| f.id == destination.file_id)?;
        let project = state.projects.iter().find(|p| p.id == file.project_id)?;
        Some(DestinationContext {
            destination_id: destination.id.clone(),
            destination_path: destination.path.clone(),
            last_local_hash: destination.last_local_hash.clone(),
            last_render_hash: destination.last_render_hash.clone(),
            last_tool_write_at: destination.last_tool_write_at,
            file_id: file.id.clone(),
            template_path: file.template_path.clone(),
            mapping_path: file.mapping_path.clone(),
            project_id: project.id.clone(),
            local_clone_path: project.local_clone_path.clone(),
            region: project.region.clone(),
            secret_id: project.secret_id.clone(),
            github_owner: project.github_owner.clone(),
            github_repo: project.github_repo.clone(),
        })
    }
}

impl MetadataStore for JsonStore {
    fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        Ok(self.with_state(|s| s.projects.clone()))
    }

    fn find_project(&self, id: &str) -> Result<Option<ProjectRecord>> {
        Ok(self.with_state(|s| s.projects.iter().find(|p| p.id == id).cloned()))
    }

    fn find_project_by_root(&self, root: &Path) -> Result<Option<ProjectRecord>> {
        Ok(self.with_state(|s| {
            s.projects
                .iter()
                .find(|p| p.local_repo_root == root)
                .cloned()
        }))
    }

    fn create_project(&self, record: ProjectRecord) -> Result<()> {
        self.mutate(|s| {
            s.projects.push(record);
            Ok(())
        })
    }

    fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<()> {
        self.mutate(|s| {
            let project = s
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| Error::ProjectNotFound { id: id.to_string() })?;
            if let Some(owner) = update.github_owner {
                project.github_owner = Some(owner);
            }
            if let Some(repo) = update.github_repo {
                project.github_repo = Some(repo);
            }
            if let Some(url) = update.github_clone_url {
                project.github_clone_url = Some(url);
            }
            if let Some(region) = update.region {
                project.region = Some(region);
            }
            if let Some(secret_id) = update.secret_id {
                project.secret_id = Some(secret_id);
            }
            Ok(())
        })
    }

    fn find_file(&self, id: &str) -> Result<Option<FileRecord>> {
        Ok(self.with_state(|s| s.files.iter().find(|f| f.id == id).cloned()))
    }

    fn find_file_by_project_path(
        &self,
        project_id: &str,
        source_relative_path: &str,
    ) -> Result<Option<FileRecord>> {
        Ok(self.with_state(|s| {
            s.files
                .iter()
                .find(|f| f.project_id == project_id && f.source_relative_path == source_relative_path)
                .cloned()
        }))
    }

    fn create_file(&self, record: FileRecord) -> Result<()> {
        self.mutate(|s| {
            s.files.push(record);
            Ok(())
        })
    }

    fn destination_context(&self, path: &Path) -> Result<Option<DestinationContext>> {
        Ok(self.with_state(|s| {
            s.destinations
                .iter()
                .find(|d| d.enabled && d.path == path)
                .and_then(|d| Self::context_for(s, d))
        }))
    }

    fn list_destination_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(self.with_state(|s| {
            s.destinations
                .iter()
                .filter(|d| d.enabled)
                .map(|d| d.path.clone())
                .collect()
        }))
    }

    fn list_destinations_by_file(&self, file_id: &str) -> Result<Vec<DestinationRecord>> {
        Ok(self.with_state(|s| {
            s.destinations
                .iter()
                .filter(|d| d.file_id == file_id)
                .cloned()
                .collect()
        }))
    }

    fn find_destination(&self, file_id: &str, path: &Path) -> Result<Option<DestinationRecord>> {
        Ok(self.with_state(|s| {
            s.destinations
                .iter()
                .find(|d| d.file_id == file_id && d.path == path)
                .cloned()
        }))
    }

    fn find_destination_by_id(&self, id: &str) -> Result<Option<DestinationRecord>> {
        Ok(self.with_state(|s| s.destinations.iter().find(|d| d.id == id).cloned()))
    }

    fn create_destination(&self, record: DestinationRecord) -> Result<()> {
        self.mutate(|s| {
            s.destinations.push(record);
            Ok(())
        })
    }

    fn update_destination(&self, id: &str, update: DestinationUpdate) -> Result<()> {
        self.mutate(|s| {
            let destination = s
                .destinations
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| Error::DestinationNotFound { id: id.to_string() })?;
            if let Some(hash) = update.last_local_hash {
                destination.last_local_hash = Some(hash);
            }
            if let Some(hash) = update.last_render_hash {
                destination.last_render_hash = Some(hash);
            }
            if let Some(at) = update.last_tool_write_at {
                destination.last_tool_write_at = Some(at);
            }
            destination.updated_at = now_rfc3339();
            Ok(())
        })
    }

    fn set_destination_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        self.mutate(|s| {
            let destination = s
                .destinations
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| Error::DestinationNotFound { id: id.to_string() })?;
            destination.enabled = enabled;
            destination.updated_at = now_rfc3339();
            Ok(())
        })
    }

    fn find_conflict(&self, id: &str) -> Result<Option<ConflictRecord>> {
        Ok(self.with_state(|s| s.conflicts.iter().find(|c| c.id == id).cloned()))
    }

    fn find_open_conflict(&self, destination_id: &str) -> Result<Option<ConflictRecord>> {
        Ok(self.with_state(|s| {
            s.conflicts
                .iter()
                .find(|c| c.destination_id == destination_id && c.status == ConflictStatus::Open)
                .cloned()
        }))
    }

    fn list_open_conflicts(&self) -> Result<Vec<ConflictRecord>> {
        Ok(self.with_state(|s| {
            s.conflicts
                .iter()
                .filter(|c| c.status == ConflictStatus::Open)
                .cloned()
                .collect()
        }))
    }

    fn create_conflict(&self, record: ConflictRecord) -> Result<()> {
        self.mutate(|s| {
            s.conflicts.push(record);
            Ok(())
        })
    }

    fn resolve_conflict(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let conflict = s
                .conflicts
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| Error::ConflictNotFound { id: id.to_string() })?;
            conflict.status = ConflictStatus::Resolved;
            Ok(())
        })
    }
}
