//! Tracking a local file
//!
//! `add_file` is the entry point that brings a `.env` file under
//! management: it resolves (or creates) the project for the enclosing git
//! work tree, classifies the file's secret keys, writes the first template
//! and mapping into the project clone, records the destination, and seeds
//! the secret blob. The clone is left uncommitted; the first propagation
//! commits it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use vault_env::{EnvDocument, FileMapping, collect_all_keys, collect_heuristic_keys,
    collect_marker_keys, render};
use vault_store::{
    DestinationRecord, DestinationUpdate, FileRecord, ProjectRecord, new_id, now_rfc3339,
};

use crate::context::EngineContext;
use crate::layout::{ProjectMetadata, ProjectSecretsMetadata, mapping_path_for, template_path_for};
use crate::{Error, Result};

/// Options for [`add_file`].
#[derive(Debug, Clone, Default)]
pub struct AddFileOptions {
    /// Explicit secret keys. When given, classification is skipped entirely.
    pub secret_keys: Option<Vec<String>>,
}

/// What tracking produced, for display by the caller.
#[derive(Debug, Clone)]
pub struct AddFileResult {
    pub project_id: String,
    pub file_id: String,
    /// Template path relative to the project clone.
    pub template_path: String,
    /// Mapping path relative to the project clone.
    pub mapping_path: String,
    pub secret_keys: BTreeSet<String>,
    /// Non-fatal problems, e.g. a failed initial blob upsert.
    pub warnings: Vec<String>,
}

/// Bring a local `.env` file under management.
pub fn add_file(ctx: &EngineContext, path: &Path, options: AddFileOptions) -> Result<AddFileResult> {
    if !path.is_file() {
        return Err(Error::NotAFile {
            path: path.to_path_buf(),
        });
    }
    if !is_env_file(path) {
        return Err(Error::UnsupportedFile {
            path: path.to_path_buf(),
        });
    }
    let path = path.canonicalize().map_err(|e| vault_fs::Error::io(path, e))?;

    let repo_root = discover_repo_root(&path)?;
    let project = find_or_create_project(ctx, &repo_root)?;

    let relative = relative_posix(&path, &repo_root);
    let file = find_or_create_file(ctx, &project.id, &relative)?;

    let content = vault_fs::read_text(&path)?;
    let document = EnvDocument::parse(&content);

    let mut warnings = Vec::new();
    let secret_keys = classify_keys(&document, options.secret_keys, &mut warnings);

    let output = render(&document, &secret_keys);
    let mapping = FileMapping::new(&file.id, &file.template_path, &file.kind, &secret_keys);

    let clone_path = &project.local_clone_path;
    vault_fs::write_atomic(
        &clone_path.join(&file.template_path),
        output.template.serialize().as_bytes(),
    )?;
    vault_fs::write_atomic(
        &clone_path.join(&file.mapping_path),
        mapping.to_json()?.as_bytes(),
    )?;

    let destination = match ctx.store.find_destination(&file.id, &path)? {
        Some(existing) => existing,
        None => {
            let record = DestinationRecord::new(&file.id, &path);
            ctx.store.create_destination(record.clone())?;
            record
        }
    };
    ctx.store.update_destination(
        &destination.id,
        DestinationUpdate {
            last_local_hash: Some(vault_fs::hash_content(&content)),
            ..Default::default()
        },
    )?;

    if let Some(secret_id) = &project.secret_id
        && !output.secrets.is_empty()
    {
        if let Err(e) = ctx
            .secrets
            .upsert_blob(secret_id, project.region.as_deref(), &output.secrets)
        {
            warnings.push(format!("initial secret upload failed: {e}"));
        }
    }

    info!(
        path = %path.display(),
        project = %project.id,
        file = %file.id,
        keys = secret_keys.len(),
        "file tracked"
    );
    Ok(AddFileResult {
        project_id: project.id,
        file_id: file.id,
        template_path: file.template_path,
        mapping_path: file.mapping_path,
        secret_keys,
        warnings,
    })
}

/// `.env`, `.env.production`, `local.env` and friends.
fn is_env_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name == ".env" || name.starts_with(".env.") || name.ends_with(".env")
}

fn discover_repo_root(path: &Path) -> Result<PathBuf> {
    let start = path.parent().unwrap_or(path);
    let repo = git2::Repository::discover(start).map_err(|_| Error::GitRootNotFound {
        path: path.to_path_buf(),
    })?;
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::GitRootNotFound {
            path: path.to_path_buf(),
        })
}

fn find_or_create_project(ctx: &EngineContext, repo_root: &Path) -> Result<ProjectRecord> {
    if let Some(existing) = ctx.store.find_project_by_root(repo_root)? {
        return Ok(existing);
    }

    let id = new_id();
    let display_name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let clone_path = ctx.repos_dir().join(&id);
    let region = std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .ok();
    let secret_id = format!("syncvault/local/{id}");

    let (github_owner, github_repo, github_clone_url) = match origin_remote(repo_root) {
        Some(url) => {
            let parsed = parse_github_remote(&url);
            (
                parsed.as_ref().map(|(o, _)| o.clone()),
                parsed.as_ref().map(|(_, r)| r.clone()),
                Some(url),
            )
        }
        None => (None, None, None),
    };

    let project = ProjectRecord {
        id: id.clone(),
        local_repo_root: repo_root.to_path_buf(),
        display_name,
        github_owner,
        github_repo,
        github_clone_url,
        local_clone_path: clone_path.clone(),
        region: region.clone(),
        secret_id: Some(secret_id.clone()),
        poll_interval_seconds: 20,
        created_at: now_rfc3339(),
    };
    ctx.store.create_project(project.clone())?;

    vault_git::ensure_clone(&clone_path, None)?;

    let meta_path = ProjectMetadata::path_in(&clone_path);
    if !meta_path.exists() {
        let meta = ProjectMetadata {
            project_id: Some(id.clone()),
            aws: Some(ProjectSecretsMetadata {
                region,
                secret_id: Some(secret_id),
            }),
        };
        vault_fs::write_atomic(&meta_path, serde_json::to_string_pretty(&meta)?.as_bytes())?;
    }

    debug!(project = %id, root = %repo_root.display(), "project created");
    Ok(project)
}

fn find_or_create_file(
    ctx: &EngineContext,
    project_id: &str,
    relative: &str,
) -> Result<FileRecord> {
    if let Some(existing) = ctx.store.find_file_by_project_path(project_id, relative)? {
        return Ok(existing);
    }

    let id = new_id();
    let file = FileRecord {
        id: id.clone(),
        project_id: project_id.to_string(),
        source_relative_path: relative.to_string(),
        template_path: template_path_for(relative),
        mapping_path: mapping_path_for(&id),
        kind: "dotenv".to_string(),
    };
    ctx.store.create_file(file.clone())?;
    Ok(file)
}

/// Explicit keys win; otherwise markers and name heuristics; a file with no
/// recognizable secrets treats every key as secret rather than publishing
/// values into the template.
fn classify_keys(
    document: &EnvDocument,
    explicit: Option<Vec<String>>,
    warnings: &mut Vec<String>,
) -> BTreeSet<String> {
    if let Some(keys) = explicit {
        return keys.into_iter().collect();
    }

    let mut keys = collect_marker_keys(document);
    keys.extend(collect_heuristic_keys(document));
    if keys.is_empty() {
        keys = collect_all_keys(document);
        if !keys.is_empty() {
            warnings.push(
                "no keys looked secret; treating every key as secret".to_string(),
            );
        }
    }
    keys
}

fn relative_posix(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn origin_remote(repo_root: &Path) -> Option<String> {
    let repo = git2::Repository::open(repo_root).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(str::to_string)
}

/// Extract `(owner, repo)` from an `origin` URL in either SSH or HTTPS
/// GitHub form.
fn parse_github_remote(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut parts = rest.splitn(2, '/');
    let owner = parts.next()?.trim();
    let repo = parts.next()?.trim().trim_end_matches('/');
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
