//! The metadata record-access contract
//!
//! This is the shape the engine consumes, not a SQL layer. Every operation
//! re-reads persisted state; no implementation may hand out cached rows that
//! survive across engine operations.

use std::path::{Path, PathBuf};

use crate::Result;
use crate::records::{
    ConflictRecord, DestinationContext, DestinationRecord, DestinationUpdate, FileRecord,
    ProjectRecord, ProjectUpdate,
};

/// Record access used by the watcher, the poller and the resolver.
pub trait MetadataStore: Send + Sync {
    // Projects
    fn list_projects(&self) -> Result<Vec<ProjectRecord>>;
    fn find_project(&self, id: &str) -> Result<Option<ProjectRecord>>;
    fn find_project_by_root(&self, root: &Path) -> Result<Option<ProjectRecord>>;
    fn create_project(&self, record: ProjectRecord) -> Result<()>;
    fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<()>;

    // Files
    fn find_file(&self, id: &str) -> Result<Option<FileRecord>>;
    fn find_file_by_project_path(
        &self,
        project_id: &str,
        source_relative_path: &str,
    ) -> Result<Option<FileRecord>>;
    fn create_file(&self, record: FileRecord) -> Result<()>;

    // Destinations
    /// Full joined context for the destination at `path`, or `None` when the
    /// path is not tracked or its destination is disabled.
    fn destination_context(&self, path: &Path) -> Result<Option<DestinationContext>>;
    /// Paths of all enabled destinations, the set the watcher registers.
    fn list_destination_paths(&self) -> Result<Vec<PathBuf>>;
    fn list_destinations_by_file(&self, file_id: &str) -> Result<Vec<DestinationRecord>>;
    fn find_destination(&self, file_id: &str, path: &Path) -> Result<Option<DestinationRecord>>;
    fn find_destination_by_id(&self, id: &str) -> Result<Option<DestinationRecord>>;
    fn create_destination(&self, record: DestinationRecord) -> Result<()>;
    fn update_destination(&self, id: &str, update: DestinationUpdate) -> Result<()>;
    /// Soft-disable (or re-enable) a destination; rows are never deleted.
    fn set_destination_enabled(&self, id: &str, enabled: bool) -> Result<()>;

    // Conflicts
    fn find_conflict(&self, id: &str) -> Result<Option<ConflictRecord>>;
    fn find_open_conflict(&self, destination_id: &str) -> Result<Option<ConflictRecord>>;
    fn list_open_conflicts(&self) -> Result<Vec<ConflictRecord>>;
    fn create_conflict(&self, record: ConflictRecord) -> Result<()>;
    /// Transition a conflict to resolved. The row stays.
    fn resolve_conflict(&self, id: &str) -> Result<()>;
}
