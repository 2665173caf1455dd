//! Remote poller
//!
//! Every tick pulls each project clone, hydrates every mapped template from
//! the secret blob, and reconciles each enabled destination through the
//! decision logic in [`crate::state`]. Failures are per project or per
//! destination: a broken pull or mapping is logged and skipped, the pass
//! carries on.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use vault_env::FileMapping;
use vault_store::{
    ConflictRecord, DestinationRecord, DestinationUpdate, ProjectRecord, SecretBlob, SecretError,
    now_millis,
};

use crate::context::EngineContext;
use crate::layout::{FILES_DIR, ProjectMetadata};
use crate::state::{SyncDecision, classify};
use crate::sync::local::propagate_local;
use crate::{Error, Result};

/// Handle to the periodic poller thread.
pub struct RemotePoller {
    control: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl RemotePoller {
    /// Run a first pass immediately, then repeat on the configured interval.
    pub fn start(ctx: Arc<EngineContext>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("syncvault-poller".to_string())
            .spawn(move || {
                let interval = ctx.settings.poll_interval();
                loop {
                    if let Err(e) = run_pass(&ctx) {
                        warn!(error = %e, "poll pass failed");
                    }
                    match rx.recv_timeout(interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                }
            })
            .map_err(Error::Io)?;

        Ok(Self {
            control: tx,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for the in-flight pass to finish.
    pub fn stop(mut self) {
        let _ = self.control.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// One full poll pass over every project.
///
/// Passes never overlap: a pass that finds the previous one still running
/// is skipped, not queued.
pub fn run_pass(ctx: &EngineContext) -> Result<()> {
    let Ok(_pass) = ctx.pass_guard.try_lock() else {
        debug!("previous poll pass still running, skipping");
        return Ok(());
    };

    for project in ctx.store.list_projects()? {
        if let Err(e) = poll_project(ctx, &project) {
            warn!(project = %project.id, error = %e, "project poll failed");
        }
    }
    Ok(())
}

fn poll_project(ctx: &EngineContext, project: &ProjectRecord) -> Result<()> {
    let clone_path = &project.local_clone_path;

    if let Some(url) = &project.github_clone_url {
        vault_git::ensure_clone(clone_path, Some(url))?;
        let branch = vault_git::current_branch(clone_path).unwrap_or_else(|_| "main".to_string());
        if let Err(e) = vault_git::pull(clone_path, "origin", &branch) {
            warn!(project = %project.id, error = %e, "pull failed, using last known clone");
        }
    } else if !clone_path.join(".git").exists() {
        // Local-only project with no clone yet; nothing to reconcile.
        return Ok(());
    }

    // Committed metadata wins over the local record so that a secret id
    // rotated on another machine takes effect here without re-tracking.
    let meta = ProjectMetadata::load(clone_path).unwrap_or_default();
    let region = meta
        .region()
        .map(str::to_string)
        .or_else(|| project.region.clone());
    let secret_id = meta
        .secret_id()
        .map(str::to_string)
        .or_else(|| project.secret_id.clone());

    let blob = match &secret_id {
        Some(id) => match ctx.secrets.get_blob(id, region.as_deref()) {
            Ok(blob) => blob,
            // Nothing upserted yet; hydrate with placeholders intact
            Err(SecretError::NotFound { .. }) => SecretBlob::new(),
            Err(e) => return Err(e.into()),
        },
        None => SecretBlob::new(),
    };

    let files_dir = clone_path.join(FILES_DIR);
    if !files_dir.is_dir() {
        return Ok(());
    }

    for entry in std::fs::read_dir(&files_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Err(e) = poll_mapping(ctx, project, &path, &blob) {
            warn!(mapping = %path.display(), error = %e, "mapping poll failed");
        }
    }
    Ok(())
}

fn poll_mapping(
    ctx: &EngineContext,
    project: &ProjectRecord,
    mapping_path: &Path,
    blob: &SecretBlob,
) -> Result<()> {
    let raw = vault_fs::read_text(mapping_path)?;
    let mapping = FileMapping::from_json(mapping_path, &raw)?;

    let template_full = project.local_clone_path.join(&mapping.template_path);
    if !template_full.exists() {
        return Err(Error::TemplateMissing {
            path: template_full,
        });
    }
    let template = vault_fs::read_text(&template_full)?;

    let values = mapping.resolve_blob_values(blob);
    let hydrated = vault_env::hydrate(&template, &values);
    let fresh_hash = vault_fs::hash_content(&hydrated);

    for destination in ctx.store.list_destinations_by_file(&mapping.file_id)? {
        if !destination.enabled {
            continue;
        }
        if let Err(e) = reconcile_destination(ctx, &destination, &hydrated, &fresh_hash) {
            warn!(path = %destination.path.display(), error = %e, "destination reconcile failed");
        }
    }
    Ok(())
}

/// Apply the decision for one destination under its lock.
fn reconcile_destination(
    ctx: &EngineContext,
    destination: &DestinationRecord,
    hydrated: &str,
    fresh_hash: &str,
) -> Result<()> {
    let lock = ctx.locks.for_path(&destination.path);
    let _guard = lock.lock().expect("destination lock poisoned");

    // The record may have moved since the pass listed it
    let Some(destination) = ctx.store.find_destination_by_id(&destination.id)? else {
        return Ok(());
    };

    if !destination.path.exists() {
        vault_fs::write_atomic(&destination.path, hydrated.as_bytes())?;
        ctx.store.update_destination(
            &destination.id,
            DestinationUpdate::after_render_write(fresh_hash, now_millis()),
        )?;
        info!(path = %destination.path.display(), "materialized missing destination");
        return Ok(());
    }

    let current = vault_fs::read_text(&destination.path)?;
    let current_hash = vault_fs::hash_content(&current);

    match classify(
        &current_hash,
        destination.last_render_hash.as_deref(),
        fresh_hash,
    ) {
        SyncDecision::InSync => Ok(()),
        SyncDecision::NeedsRenderWrite => {
            vault_fs::write_atomic(&destination.path, hydrated.as_bytes())?;
            ctx.store.update_destination(
                &destination.id,
                DestinationUpdate::after_render_write(fresh_hash, now_millis()),
            )?;
            info!(path = %destination.path.display(), "applied remote update");
            Ok(())
        }
        SyncDecision::LocalAhead => {
            let Some(context) = ctx.store.destination_context(&destination.path)? else {
                return Ok(());
            };
            propagate_local(ctx, &context)?;
            // Disk content was not touched; record that both sides now agree
            // on it so the next pass classifies it in sync.
            ctx.store.update_destination(
                &destination.id,
                DestinationUpdate {
                    last_local_hash: Some(current_hash.clone()),
                    last_render_hash: Some(current_hash),
                    last_tool_write_at: None,
                },
            )?;
            info!(path = %destination.path.display(), "propagated local edits upstream");
            Ok(())
        }
        SyncDecision::Conflict => record_conflict(ctx, &destination, &current, hydrated),
    }
}

/// Snapshot both sides and open a conflict row, unless one is already open
/// for this destination.
fn record_conflict(
    ctx: &EngineContext,
    destination: &DestinationRecord,
    local_content: &str,
    remote_content: &str,
) -> Result<()> {
    let snapshot_dir = ctx.conflict_dir(&destination.path);
    let local_copy = snapshot_dir.join("local");
    let remote_copy = snapshot_dir.join("remote");
    vault_fs::write_atomic(&local_copy, local_content.as_bytes())?;
    vault_fs::write_atomic(&remote_copy, remote_content.as_bytes())?;

    if ctx.store.find_open_conflict(&destination.id)?.is_some() {
        debug!(path = %destination.path.display(), "conflict already open, snapshots refreshed");
        return Ok(());
    }

    let conflict = ConflictRecord::open(&destination.id, &local_copy, &remote_copy);
    warn!(
        path = %destination.path.display(),
        conflict = %conflict.id,
        "both sides changed, conflict opened"
    );
    ctx.store.create_conflict(conflict)?;
    Ok(())
}
