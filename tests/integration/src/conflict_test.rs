//! Conflict detection and resolution: both sides change between passes, the
//! engine refuses to pick a winner, and an explicit resolution closes the
//! row.

#[allow(dead_code)]
mod common;

use pretty_assertions::assert_eq;

use common::{Harness, Workspace, blob, read};
use vault_core::sync::poll::run_pass;
use vault_core::{AddFileOptions, add_file, resolve_keep_local, resolve_keep_remote};
use vault_store::ConflictRecord;

const LOCAL_EDIT: &str = "DB_PASSWORD=local-edit\nPORT=8080\n";
const REMOTE_RENDER: &str = "DB_PASSWORD=remote-edit\nPORT=8080\n";

/// Track a file, let the first pass stamp it, then edit both sides.
fn diverge() -> (Harness, Workspace, String) {
    let h = Harness::new();
    let ws = Workspace::with_env("DB_PASSWORD=secret!SYNCVAULT\nPORT=8080\n");
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    run_pass(&h.ctx).unwrap();

    ws.write_env(LOCAL_EDIT);
    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let secret_id = project.secret_id.unwrap();
    h.ctx
        .secrets
        .upsert_blob(&secret_id, None, &blob(&[("DB_PASSWORD", "remote-edit")]))
        .unwrap();

    run_pass(&h.ctx).unwrap();
    (h, ws, secret_id)
}

fn open_conflict(h: &Harness) -> ConflictRecord {
    let mut conflicts = h.ctx.store.list_open_conflicts().unwrap();
    assert_eq!(conflicts.len(), 1);
    conflicts.remove(0)
}

#[test]
fn divergent_changes_open_one_conflict_and_leave_the_disk_alone() {
    let (h, ws, _) = diverge();

    let conflict = open_conflict(&h);
    assert_eq!(read(&conflict.local_copy_path), LOCAL_EDIT);
    assert_eq!(read(&conflict.remote_copy_path), REMOTE_RENDER);
    assert_eq!(ws.read_env(), LOCAL_EDIT);

    // Re-detection refreshes the snapshots, never duplicates the row
    run_pass(&h.ctx).unwrap();
    assert_eq!(h.ctx.store.list_open_conflicts().unwrap().len(), 1);
}

#[test]
fn keep_local_pushes_the_disk_content_upstream() {
    let (h, ws, secret_id) = diverge();
    let conflict = open_conflict(&h);

    resolve_keep_local(&h.ctx, &conflict.id).unwrap();

    assert!(h.ctx.store.list_open_conflicts().unwrap().is_empty());
    assert_eq!(ws.read_env(), LOCAL_EDIT);
    assert_eq!(
        h.ctx.secrets.get_blob(&secret_id, None).unwrap(),
        blob(&[("DB_PASSWORD", "local-edit")])
    );
    assert!(!conflict.local_copy_path.exists());
    assert!(!conflict.remote_copy_path.exists());

    // The next pass sees the sides agreeing
    run_pass(&h.ctx).unwrap();
    assert!(h.ctx.store.list_open_conflicts().unwrap().is_empty());
    assert_eq!(ws.read_env(), LOCAL_EDIT);
}

#[test]
fn keep_remote_overwrites_the_disk_content() {
    let (h, ws, secret_id) = diverge();
    let conflict = open_conflict(&h);

    resolve_keep_remote(&h.ctx, &conflict.id).unwrap();

    assert!(h.ctx.store.list_open_conflicts().unwrap().is_empty());
    assert_eq!(ws.read_env(), REMOTE_RENDER);
    assert_eq!(
        h.ctx.secrets.get_blob(&secret_id, None).unwrap(),
        blob(&[("DB_PASSWORD", "remote-edit")])
    );
    assert!(!conflict.local_copy_path.exists());
    assert!(!conflict.remote_copy_path.exists());

    run_pass(&h.ctx).unwrap();
    assert!(h.ctx.store.list_open_conflicts().unwrap().is_empty());
}

#[test]
fn resolving_a_closed_conflict_is_an_error() {
    let (h, _ws, _) = diverge();
    let conflict = open_conflict(&h);

    resolve_keep_local(&h.ctx, &conflict.id).unwrap();
    let err = resolve_keep_remote(&h.ctx, &conflict.id).unwrap_err();
    assert!(matches!(err, vault_core::Error::ConflictNotOpen { .. }));
}

#[test]
fn resolving_an_unknown_conflict_is_an_error() {
    let h = Harness::new();
    let err = resolve_keep_local(&h.ctx, "no-such-id").unwrap_err();
    assert!(matches!(err, vault_core::Error::ConflictNotFound { .. }));
}
