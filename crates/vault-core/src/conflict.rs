//! Conflict resolution
//!
//! A conflict is resolved by explicitly choosing a side. Keeping the local
//! side propagates the on-disk content upstream; keeping the remote side
//! overwrites the destination from the detection-time snapshot (or a fresh
//! hydration when the snapshot is gone). Either way the row is marked
//! resolved and the snapshots are deleted only after every other step
//! succeeded, so a failed resolution leaves the conflict open and
//! retryable.

use tracing::info;

use vault_env::FileMapping;
use vault_store::{
    ConflictRecord, ConflictStatus, DestinationContext, DestinationUpdate, SecretBlob,
    SecretError, now_millis,
};

use crate::context::EngineContext;
use crate::sync::local::propagate_local;
use crate::{Error, Result};

/// Resolve a conflict by keeping the on-disk content and pushing it
/// upstream.
pub fn resolve_keep_local(ctx: &EngineContext, conflict_id: &str) -> Result<()> {
    let (conflict, context) = load_open_conflict(ctx, conflict_id)?;

    let lock = ctx.locks.for_path(&context.destination_path);
    let _guard = lock.lock().expect("destination lock poisoned");

    // A destination deleted since detection is restored from the snapshot
    // before propagating.
    if !context.destination_path.exists() {
        if !conflict.local_copy_path.exists() {
            return Err(Error::LocalCopyMissing {
                id: conflict.id.clone(),
            });
        }
        let snapshot = vault_fs::read_text(&conflict.local_copy_path)?;
        vault_fs::write_atomic(&context.destination_path, snapshot.as_bytes())?;
    }

    propagate_local(ctx, &context)?;

    let content = vault_fs::read_text(&context.destination_path)?;
    ctx.store.update_destination(
        &context.destination_id,
        DestinationUpdate::after_render_write(&vault_fs::hash_content(&content), now_millis()),
    )?;

    finish(ctx, &conflict)?;
    info!(conflict = conflict_id, path = %context.destination_path.display(), "conflict resolved keeping local");
    Ok(())
}

/// Resolve a conflict by overwriting the destination with the remote
/// content.
pub fn resolve_keep_remote(ctx: &EngineContext, conflict_id: &str) -> Result<()> {
    let (conflict, context) = load_open_conflict(ctx, conflict_id)?;

    let lock = ctx.locks.for_path(&context.destination_path);
    let _guard = lock.lock().expect("destination lock poisoned");

    let remote_content = if conflict.remote_copy_path.exists() {
        vault_fs::read_text(&conflict.remote_copy_path)?
    } else {
        hydrate_fresh(ctx, &context)?
    };

    vault_fs::write_atomic(&context.destination_path, remote_content.as_bytes())?;
    ctx.store.update_destination(
        &context.destination_id,
        DestinationUpdate::after_render_write(
            &vault_fs::hash_content(&remote_content),
            now_millis(),
        ),
    )?;

    finish(ctx, &conflict)?;
    info!(conflict = conflict_id, path = %context.destination_path.display(), "conflict resolved keeping remote");
    Ok(())
}

fn load_open_conflict(
    ctx: &EngineContext,
    conflict_id: &str,
) -> Result<(ConflictRecord, DestinationContext)> {
    let conflict = ctx
        .store
        .find_conflict(conflict_id)?
        .ok_or_else(|| Error::ConflictNotFound {
            id: conflict_id.to_string(),
        })?;
    if conflict.status != ConflictStatus::Open {
        return Err(Error::ConflictNotOpen {
            id: conflict_id.to_string(),
        });
    }

    let destination = ctx
        .store
        .find_destination_by_id(&conflict.destination_id)?
        .ok_or_else(|| Error::ContextUnavailable {
            id: conflict_id.to_string(),
        })?;
    let context = ctx
        .store
        .destination_context(&destination.path)?
        .ok_or_else(|| Error::ContextUnavailable {
            id: conflict_id.to_string(),
        })?;

    Ok((conflict, context))
}

/// Re-hydrate the remote content from the clone when the detection-time
/// snapshot no longer exists.
fn hydrate_fresh(ctx: &EngineContext, context: &DestinationContext) -> Result<String> {
    let mapping_full = context.local_clone_path.join(&context.mapping_path);
    if !mapping_full.exists() {
        return Err(Error::MappingMissing { path: mapping_full });
    }
    let mapping = FileMapping::from_json(&mapping_full, &vault_fs::read_text(&mapping_full)?)?;

    let template_full = context.local_clone_path.join(&context.template_path);
    if !template_full.exists() {
        return Err(Error::TemplateMissing {
            path: template_full,
        });
    }
    let template = vault_fs::read_text(&template_full)?;

    let blob = match &context.secret_id {
        Some(id) => match ctx.secrets.get_blob(id, context.region.as_deref()) {
            Ok(blob) => blob,
            Err(SecretError::NotFound { .. }) => SecretBlob::new(),
            Err(e) => return Err(e.into()),
        },
        None => SecretBlob::new(),
    };

    Ok(vault_env::hydrate(&template, &mapping.resolve_blob_values(&blob)))
}

/// Mark resolved and clean up snapshots. Runs last.
fn finish(ctx: &EngineContext, conflict: &ConflictRecord) -> Result<()> {
    ctx.store.resolve_conflict(&conflict.id)?;
    vault_fs::remove_if_exists(&conflict.local_copy_path)?;
    vault_fs::remove_if_exists(&conflict.remote_copy_path)?;
    Ok(())
}
