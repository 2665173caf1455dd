//! Pulling a tracked file onto a new machine
//!
//! `pull_file` is the inverse of tracking: given a project repository and a
//! file id, it clones the repository, hydrates the template from the secret
//! blob, writes the result to the requested destination and records the
//! project, file and destination so the engine keeps the new copy in sync
//! from then on.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use vault_env::FileMapping;
use vault_store::{
    DestinationRecord, DestinationUpdate, FileRecord, ProjectRecord, SecretBlob, SecretError,
    now_millis, now_rfc3339,
};

use crate::context::EngineContext;
use crate::layout::{ProjectMetadata, TEMPLATES_DIR, mapping_path_for};
use crate::{Error, Result};

/// The repository a file is pulled from.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub owner: String,
    pub repo: String,
    pub clone_url: String,
}

/// What pulling produced.
#[derive(Debug, Clone)]
pub struct PullFileResult {
    pub project_id: String,
    pub destination_path: PathBuf,
    /// Placeholder keys the blob had no value for; those placeholders remain
    /// in the written file.
    pub missing_keys: Vec<String>,
}

/// Materialize a tracked file from a project repository onto this machine.
pub fn pull_file(
    ctx: &EngineContext,
    source: &RemoteSource,
    file_id: &str,
    dest_path: &Path,
) -> Result<PullFileResult> {
    let clone_path = ctx
        .repos_dir()
        .join(format!("{}-{}", source.owner, source.repo));
    vault_git::ensure_clone(&clone_path, Some(&source.clone_url))?;
    let branch =
        vault_git::current_branch(&clone_path).unwrap_or_else(|_| "main".to_string());
    if let Err(e) = vault_git::pull(&clone_path, "origin", &branch) {
        warn!(error = %e, "pull failed, using the clone as fetched");
    }

    let mapping_full = clone_path.join(mapping_path_for(file_id));
    if !mapping_full.exists() {
        return Err(Error::MappingMissing { path: mapping_full });
    }
    let mapping = FileMapping::from_json(&mapping_full, &vault_fs::read_text(&mapping_full)?)?;

    let template_full = clone_path.join(&mapping.template_path);
    if !template_full.exists() {
        return Err(Error::TemplateMissing {
            path: template_full,
        });
    }
    let template = vault_fs::read_text(&template_full)?;

    let meta = ProjectMetadata::load(&clone_path).unwrap_or_default();
    let project_id = meta
        .project_id
        .clone()
        .unwrap_or_else(|| format!("{}-{}", source.owner, source.repo));
    let region = meta.region().map(str::to_string);

    let (blob, secret_id) = fetch_blob(ctx, &meta, source, &project_id, region.as_deref());

    let values = mapping.resolve_blob_values(&blob);
    let hydrated = vault_env::hydrate(&template, &values);
    let missing_keys: Vec<String> = mapping
        .secret_keys()
        .into_iter()
        .filter(|key| !values.contains_key(key))
        .collect();
    if !missing_keys.is_empty() {
        warn!(keys = ?missing_keys, "blob is missing values, placeholders left in place");
    }

    vault_fs::write_atomic(dest_path, hydrated.as_bytes())?;
    // Destinations are keyed by canonical path; record the file under the
    // same form tracking would have used.
    let dest_path = dest_path
        .canonicalize()
        .map_err(|e| vault_fs::Error::io(dest_path, e))?;

    let project = find_or_create_project(
        ctx,
        &project_id,
        source,
        &dest_path,
        &clone_path,
        region,
        secret_id,
    )?;
    let file = find_or_create_file(ctx, &project.id, &mapping)?;
    record_destination(ctx, &file.id, &dest_path, &vault_fs::hash_content(&hydrated))?;

    info!(
        path = %dest_path.display(),
        project = %project.id,
        file = %file.id,
        "file pulled"
    );
    Ok(PullFileResult {
        project_id: project.id,
        destination_path: dest_path,
        missing_keys,
    })
}

/// Try the known secret-id shapes in order, stopping at the first blob that
/// exists. All-missing is an empty blob, not an error.
fn fetch_blob(
    ctx: &EngineContext,
    meta: &ProjectMetadata,
    source: &RemoteSource,
    project_id: &str,
    region: Option<&str>,
) -> (SecretBlob, Option<String>) {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(id) = meta.secret_id() {
        candidates.push(id.to_string());
    }
    candidates.push(format!("syncvault/{}/{}", source.owner, project_id));
    candidates.push(format!("syncvault/{}/{}", source.owner, source.repo));
    candidates.push(format!("syncvault/local/{project_id}"));

    for id in &candidates {
        match ctx.secrets.get_blob(id, region) {
            Ok(blob) => return (blob, Some(id.clone())),
            Err(SecretError::NotFound { .. }) => {
                debug!(id, "no blob under this id");
            }
            Err(e) => {
                warn!(id, error = %e, "blob fetch failed, trying next candidate");
            }
        }
    }
    (SecretBlob::new(), candidates.first().cloned())
}

#[allow(clippy::too_many_arguments)]
fn find_or_create_project(
    ctx: &EngineContext,
    project_id: &str,
    source: &RemoteSource,
    dest_path: &Path,
    clone_path: &Path,
    region: Option<String>,
    secret_id: Option<String>,
) -> Result<ProjectRecord> {
    if let Some(existing) = ctx.store.find_project(project_id)? {
        return Ok(existing);
    }

    // The destination's enclosing work tree when there is one, otherwise its
    // directory.
    let local_repo_root = dest_path
        .parent()
        .and_then(|parent| git2::Repository::discover(parent).ok())
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
        .or_else(|| dest_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| dest_path.to_path_buf());

    let project = ProjectRecord {
        id: project_id.to_string(),
        local_repo_root,
        display_name: source.repo.clone(),
        github_owner: Some(source.owner.clone()),
        github_repo: Some(source.repo.clone()),
        github_clone_url: Some(source.clone_url.clone()),
        local_clone_path: clone_path.to_path_buf(),
        region,
        secret_id,
        poll_interval_seconds: 20,
        created_at: now_rfc3339(),
    };
    ctx.store.create_project(project.clone())?;
    Ok(project)
}

fn find_or_create_file(
    ctx: &EngineContext,
    project_id: &str,
    mapping: &FileMapping,
) -> Result<FileRecord> {
    if let Some(existing) = ctx.store.find_file(&mapping.file_id)? {
        return Ok(existing);
    }

    let source_relative_path = source_path_from_template(&mapping.template_path);
    let file = FileRecord {
        id: mapping.file_id.clone(),
        project_id: project_id.to_string(),
        source_relative_path,
        template_path: mapping.template_path.clone(),
        mapping_path: mapping_path_for(&mapping.file_id),
        kind: mapping.kind.clone(),
    };
    ctx.store.create_file(file.clone())?;
    Ok(file)
}

fn record_destination(
    ctx: &EngineContext,
    file_id: &str,
    dest_path: &Path,
    hash: &str,
) -> Result<()> {
    let destination = match ctx.store.find_destination(file_id, dest_path)? {
        Some(existing) => existing,
        None => {
            let record = DestinationRecord::new(file_id, dest_path);
            ctx.store.create_destination(record.clone())?;
            record
        }
    };
    ctx.store.update_destination(
        &destination.id,
        DestinationUpdate::after_render_write(hash, now_millis()),
    )?;
    Ok(())
}

/// `templates/<relative>.template` back to `<relative>`.
fn source_path_from_template(template_path: &str) -> String {
    let stripped = template_path
        .strip_prefix(&format!("{TEMPLATES_DIR}/"))
        .unwrap_or(template_path);
    stripped
        .strip_suffix(".template")
        .unwrap_or(stripped)
        .to_string()
}
