//! Local-change propagation
//!
//! The routine that pushes a locally edited destination upstream:
//! re-render the template, extract the secrets, write both into the project
//! clone, upsert the blob, commit and push. Shared by the watcher handler
//! and the poller's local-ahead branch. Callers hold the destination lock.

use std::path::Path;

use tracing::{debug, info};

use vault_env::{EnvDocument, FileMapping, collect_marker_keys, render};
use vault_store::{DestinationContext, DestinationUpdate};

use crate::context::EngineContext;
use crate::{Error, Result};

/// Propagate the current content of a tracked destination into its template
/// and secret blob.
///
/// Newly marker-tagged keys are unioned into the mapping first; secret
/// status is monotonic, keys are never removed here. Any step failure
/// aborts this destination only and leaves its record untouched for retry
/// on the next trigger.
pub fn propagate_local(ctx: &EngineContext, context: &DestinationContext) -> Result<()> {
    let clone_path = &context.local_clone_path;
    let mapping_full = clone_path.join(&context.mapping_path);
    if !mapping_full.exists() {
        return Err(Error::MappingMissing { path: mapping_full });
    }

    let mapping_raw = vault_fs::read_text(&mapping_full)?;
    let mut mapping = FileMapping::from_json(&mapping_full, &mapping_raw)?;

    let content = vault_fs::read_text(&context.destination_path)?;
    let document = EnvDocument::parse(&content);

    let marker_keys = collect_marker_keys(&document);
    if mapping.add_secret_keys(marker_keys.iter().map(String::as_str)) {
        debug!(path = %context.destination_path.display(), "mapping grew from explicit markers");
        vault_fs::write_atomic(&mapping_full, mapping.to_json()?.as_bytes())?;
    }

    let output = render(&document, &mapping.secret_keys());

    let template_full = clone_path.join(&context.template_path);
    vault_fs::write_atomic(&template_full, output.template.serialize().as_bytes())?;

    ctx.store.update_destination(
        &context.destination_id,
        DestinationUpdate {
            last_local_hash: Some(vault_fs::hash_content(&content)),
            ..Default::default()
        },
    )?;

    if let Some(secret_id) = &context.secret_id
        && !output.secrets.is_empty()
    {
        ctx.secrets
            .upsert_blob(secret_id, context.region.as_deref(), &output.secrets)?;
    }

    vault_git::commit_all(
        clone_path,
        &format!("SyncVault: update {}", context.template_path),
    )?;
    if context.github_owner.is_some() && context.github_repo.is_some() {
        vault_git::push(clone_path, "origin", None)?;
    }

    info!(path = %context.destination_path.display(), "synced local change");
    Ok(())
}

/// On-demand variant used by host applications: looks up the context, takes
/// the destination lock, and propagates without consulting loop
/// suppression.
pub fn sync_local_now(ctx: &EngineContext, path: &Path) -> Result<()> {
    // Destinations are keyed by canonical path; resolve the caller's form
    // first so relative and symlinked spellings find their record.
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    let lock = ctx.locks.for_path(&path);
    let _guard = lock.lock().expect("destination lock poisoned");

    let context = ctx
        .store
        .destination_context(&path)?
        .ok_or_else(|| Error::NotTracked { path })?;
    propagate_local(ctx, &context)
}
