//! Pulling a tracked file onto a second machine and keeping it in sync
//! there. Two harnesses sharing one secret store stand in for two machines
//! talking to the same remote service.

#[allow(dead_code)]
mod common;

use pretty_assertions::assert_eq;

use common::{Harness, Workspace, blob, clone_path};
use tempfile::TempDir;
use vault_core::sync::local::sync_local_now;
use vault_core::sync::poll::run_pass;
use vault_core::{AddFileOptions, RemoteSource, add_file, pull_file};

/// Track a marked file on machine A and commit its clone, so machine B has
/// something to clone from.
fn machine_a() -> (Harness, Workspace, String) {
    let h = Harness::new();
    let ws = Workspace::with_env("DB_PASSWORD=secret!SYNCVAULT\nPORT=8080\n");
    let result = add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    sync_local_now(&h.ctx, &ws.env_path).unwrap();
    (h, ws, result.file_id)
}

fn source_for(h: &Harness) -> RemoteSource {
    RemoteSource {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
        clone_url: clone_path(&h.ctx).to_string_lossy().into_owned(),
    }
}

#[test]
fn pull_hydrates_the_file_and_records_the_destination() {
    let (a, _ws, file_id) = machine_a();
    let b = Harness::sharing_secrets_of(&a);

    let dest_dir = TempDir::new().unwrap();
    let dest_path = dest_dir.path().canonicalize().unwrap().join(".env");

    let result = pull_file(&b.ctx, &source_for(&a), &file_id, &dest_path).unwrap();

    assert_eq!(
        std::fs::read_to_string(&dest_path).unwrap(),
        "DB_PASSWORD=secret\nPORT=8080\n"
    );
    assert!(result.missing_keys.is_empty());

    // Pull uses the project id committed in the repository metadata
    let project_a = a.ctx.store.list_projects().unwrap().remove(0);
    assert_eq!(result.project_id, project_a.id);

    let context = b.ctx.store.destination_context(&dest_path).unwrap().unwrap();
    assert!(context.last_render_hash.is_some());
    assert!(context.last_tool_write_at.is_some());
}

#[test]
fn pull_without_blob_access_leaves_placeholders_and_reports_keys() {
    let (a, _ws, file_id) = machine_a();
    // No shared secret store: the blob is unreachable from machine B
    let b = Harness::new();

    let dest_dir = TempDir::new().unwrap();
    let dest_path = dest_dir.path().canonicalize().unwrap().join(".env");

    let result = pull_file(&b.ctx, &source_for(&a), &file_id, &dest_path).unwrap();

    assert_eq!(result.missing_keys, vec!["DB_PASSWORD"]);
    assert_eq!(
        std::fs::read_to_string(&dest_path).unwrap(),
        "DB_PASSWORD={{SYNCVAULT:DB_PASSWORD}}\nPORT=8080\n"
    );
}

#[cfg(unix)]
#[test]
fn pull_records_the_destination_under_its_canonical_path() {
    let (a, _ws, file_id) = machine_a();
    let b = Harness::sharing_secrets_of(&a);

    let dest_dir = TempDir::new().unwrap();
    let base = dest_dir.path().canonicalize().unwrap();
    let real_dir = base.join("app");
    std::fs::create_dir(&real_dir).unwrap();
    let link_dir = base.join("link");
    std::os::unix::fs::symlink(&real_dir, &link_dir).unwrap();

    let result = pull_file(&b.ctx, &source_for(&a), &file_id, &link_dir.join(".env")).unwrap();

    // Recorded under the canonical spelling, not the symlinked one
    assert_eq!(result.destination_path, real_dir.join(".env"));
    let context = b
        .ctx
        .store
        .destination_context(&real_dir.join(".env"))
        .unwrap();
    assert!(context.is_some());
}

#[test]
fn pull_with_unknown_file_id_is_an_error() {
    let (a, _ws, _) = machine_a();
    let b = Harness::sharing_secrets_of(&a);

    let dest_dir = TempDir::new().unwrap();
    let dest_path = dest_dir.path().join(".env");

    let err = pull_file(&b.ctx, &source_for(&a), "no-such-file", &dest_path).unwrap_err();
    assert!(matches!(err, vault_core::Error::MappingMissing { .. }));
}

#[test]
fn rotation_on_machine_a_reaches_machine_b_through_the_poller() {
    let (a, ws_a, file_id) = machine_a();
    let b = Harness::sharing_secrets_of(&a);

    let dest_dir = TempDir::new().unwrap();
    let dest_path = dest_dir.path().canonicalize().unwrap().join(".env");
    pull_file(&b.ctx, &source_for(&a), &file_id, &dest_path).unwrap();

    // Machine A rotates the secret
    ws_a.write_env("DB_PASSWORD=rotated\nPORT=8080\n");
    sync_local_now(&a.ctx, &ws_a.env_path).unwrap();

    // Machine B's next pass applies it
    run_pass(&b.ctx).unwrap();
    assert_eq!(
        std::fs::read_to_string(&dest_path).unwrap(),
        "DB_PASSWORD=rotated\nPORT=8080\n"
    );

    let project_b = b.ctx.store.list_projects().unwrap().remove(0);
    assert_eq!(project_b.github_owner.as_deref(), Some("acme"));

    let stored = a
        .ctx
        .secrets
        .get_blob(
            a.ctx.store.list_projects().unwrap()[0]
                .secret_id
                .as_deref()
                .unwrap(),
            None,
        )
        .unwrap();
    assert_eq!(stored, blob(&[("DB_PASSWORD", "rotated")]));
}
