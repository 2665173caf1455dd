//! Clone, pull, commit and push primitives
//!
//! Every operation opens the repository fresh; no repository handle is held
//! across sync operations. Pulls are fast-forward only — a non-fast-forward
//! upstream is reported as an error and the caller skips the project for
//! that pass.

use std::path::Path;

use git2::{Repository, Signature, build::RepoBuilder};
use tracing::debug;

use crate::{Error, Result};

/// Make sure a repository exists at `path`.
///
/// Opens it when present. Otherwise clones from `url` when one is given, or
/// initializes an empty repository for local-only projects.
pub fn ensure_clone(path: &Path, url: Option<&str>) -> Result<()> {
    if path.join(".git").exists() {
        return Ok(());
    }

    match url {
        Some(url) => {
            debug!(url, path = %path.display(), "cloning project repository");
            RepoBuilder::new()
                .clone(url, path)
                .map_err(|e| Error::CloneFailed {
                    url: url.to_string(),
                    message: e.message().to_string(),
                })?;
        }
        None => {
            debug!(path = %path.display(), "initializing local project repository");
            std::fs::create_dir_all(path)
                .map_err(|e| git2::Error::from_str(&e.to_string()))?;
            Repository::init(path)?;
        }
    }
    Ok(())
}

/// Name of the currently checked-out branch, or `HEAD` when detached.
pub fn current_branch(path: &Path) -> Result<String> {
    let repo = Repository::open(path)?;
    let head = repo.head()?;
    if head.is_branch() {
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    } else {
        Ok("HEAD".to_string())
    }
}

/// Stage everything and commit. No-op when the tree is unchanged.
///
/// Returns whether a commit was created.
pub fn commit_all(path: &Path, message: &str) -> Result<bool> {
    let repo = Repository::open(path)?;

    let mut index = repo.index()?;
    index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree_id = index.write_tree()?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        // Unborn branch: this will be the initial commit
        Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
        Err(e) if e.code() == git2::ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    if let Some(parent_commit) = &parent
        && parent_commit.tree_id() == tree_id
    {
        debug!(path = %path.display(), "nothing to commit");
        return Ok(false);
    }

    let signature = repo
        .signature()
        .or_else(|_| Signature::now("SyncVault", "syncvault@localhost"))?;
    let tree = repo.find_tree(tree_id)?;
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    Ok(true)
}

/// Fetch from a remote and fast-forward the given branch.
///
/// Already-up-to-date is success; anything requiring a real merge is a
/// [`Error::CannotFastForward`] and leaves the working tree untouched.
pub fn pull(path: &Path, remote: &str, branch: &str) -> Result<()> {
    let repo = Repository::open(path)?;

    let mut remote_handle = repo.find_remote(remote).map_err(|_| Error::RemoteNotFound {
        name: remote.to_string(),
    })?;

    remote_handle
        .fetch(&[branch], None, None)
        .map_err(|e| Error::PullFailed {
            path: path.to_path_buf(),
            message: format!("Fetch failed: {}", e.message()),
        })?;

    let fetch_head = repo
        .find_reference("FETCH_HEAD")
        .map_err(|e| Error::PullFailed {
            path: path.to_path_buf(),
            message: format!("Could not find FETCH_HEAD: {}", e.message()),
        })?;
    let fetch_commit = fetch_head.peel_to_commit().map_err(|e| Error::PullFailed {
        path: path.to_path_buf(),
        message: format!("Could not resolve FETCH_HEAD: {}", e.message()),
    })?;

    let (merge_analysis, _) =
        repo.merge_analysis(&[&repo.find_annotated_commit(fetch_commit.id())?])?;

    if merge_analysis.is_up_to_date() {
        return Ok(());
    }

    if merge_analysis.is_fast_forward() {
        let refname = format!("refs/heads/{branch}");
        match repo.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(
                    fetch_commit.id(),
                    &format!("pull: fast-forward to {}", fetch_commit.id()),
                )?;
            }
            // Branch doesn't exist locally yet; create it at the fetched tip
            Err(_) => {
                repo.reference(
                    &refname,
                    fetch_commit.id(),
                    true,
                    &format!("pull: create {branch} at {}", fetch_commit.id()),
                )?;
            }
        }
        repo.set_head(&format!("refs/heads/{branch}"))?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        return Ok(());
    }

    Err(Error::CannotFastForward {
        message: format!(
            "Cannot fast-forward {branch} to {}. Manual merge required.",
            fetch_commit.id()
        ),
    })
}

/// Push a branch to a remote using default options (relies on credential
/// helpers).
pub fn push(path: &Path, remote: &str, branch: Option<&str>) -> Result<()> {
    let repo = Repository::open(path)?;
    let branch_name = match branch {
        Some(b) => b.to_string(),
        None => current_branch(path)?,
    };

    let mut remote_handle = repo.find_remote(remote).map_err(|_| Error::RemoteNotFound {
        name: remote.to_string(),
    })?;

    let refspec = format!("refs/heads/{branch_name}:refs/heads/{branch_name}");
    remote_handle
        .push(&[&refspec], None)
        .map_err(|e| Error::PushFailed {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

    Ok(())
}
