//! End-to-end sync flows: tracking a file, propagating local edits, and
//! applying remote updates through the poller.

#[allow(dead_code)]
mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use common::{Harness, Workspace, blob, clone_path, read};
use vault_core::{AddFileOptions, SyncSettings, add_file};
use vault_core::sync::local::sync_local_now;
use vault_core::sync::poll::run_pass;
use vault_core::sync::watch::{LocalWatcher, handle_local_change};
use vault_store::DestinationUpdate;

const MARKED_ENV: &str = "DB_PASSWORD=secret!SYNCVAULT\nPORT=8080\n";

#[test]
fn tracking_extracts_marked_secret_into_template_and_blob() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);

    let result = add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    assert_eq!(
        result.secret_keys.iter().cloned().collect::<Vec<_>>(),
        vec!["DB_PASSWORD"]
    );

    let clone = clone_path(&h.ctx);
    let template = read(&clone.join(&result.template_path));
    assert_eq!(template, "DB_PASSWORD={{SYNCVAULT:DB_PASSWORD}}\nPORT=8080\n");

    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let secret_id = project.secret_id.unwrap();
    let stored = h.ctx.secrets.get_blob(&secret_id, None).unwrap();
    assert_eq!(stored, blob(&[("DB_PASSWORD", "secret")]));

    // The local file itself is untouched by tracking
    assert_eq!(ws.read_env(), MARKED_ENV);
}

#[test]
fn tracking_classifies_by_name_when_no_marker_present() {
    let h = Harness::new();
    let ws = Workspace::with_env("API_TOKEN=abc123\nDB_HOST=localhost\n");

    let result = add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    assert_eq!(
        result.secret_keys.iter().cloned().collect::<Vec<_>>(),
        vec!["API_TOKEN"]
    );

    let template = read(&clone_path(&h.ctx).join(&result.template_path));
    assert_eq!(template, "API_TOKEN={{SYNCVAULT:API_TOKEN}}\nDB_HOST=localhost\n");
}

#[test]
fn local_edit_propagates_to_blob_and_commits_the_clone() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();

    ws.write_env("DB_PASSWORD=rotated\nPORT=8080\n");
    sync_local_now(&h.ctx, &ws.env_path).unwrap();

    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let stored = h
        .ctx
        .secrets
        .get_blob(project.secret_id.as_deref().unwrap(), None)
        .unwrap();
    assert_eq!(stored, blob(&[("DB_PASSWORD", "rotated")]));

    // Propagation commits the template into the clone
    let repo = git2::Repository::open(&project.local_clone_path).unwrap();
    assert!(repo.head().unwrap().peel_to_commit().is_ok());
}

#[test]
fn first_poll_pass_consumes_the_marker() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();

    run_pass(&h.ctx).unwrap();

    // Disk now equals the hydrated render: same value, marker gone
    assert_eq!(ws.read_env(), "DB_PASSWORD=secret\nPORT=8080\n");

    let context = h
        .ctx
        .store
        .destination_context(&ws.env_path)
        .unwrap()
        .unwrap();
    assert!(context.last_render_hash.is_some());
    assert_eq!(context.last_render_hash, context.last_local_hash);
    assert!(context.last_tool_write_at.is_some());
}

#[test]
fn remote_blob_change_is_applied_to_an_unedited_destination() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    run_pass(&h.ctx).unwrap();

    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let secret_id = project.secret_id.unwrap();
    h.ctx
        .secrets
        .upsert_blob(&secret_id, None, &blob(&[("DB_PASSWORD", "rotated")]))
        .unwrap();

    run_pass(&h.ctx).unwrap();

    assert_eq!(ws.read_env(), "DB_PASSWORD=rotated\nPORT=8080\n");
    assert!(h.ctx.store.list_open_conflicts().unwrap().is_empty());
}

#[test]
fn poll_pass_materializes_a_deleted_destination() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    run_pass(&h.ctx).unwrap();

    std::fs::remove_file(&ws.env_path).unwrap();
    run_pass(&h.ctx).unwrap();

    assert_eq!(ws.read_env(), "DB_PASSWORD=secret\nPORT=8080\n");
}

#[test]
fn already_propagated_local_edit_converges_without_conflict() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();
    run_pass(&h.ctx).unwrap();

    // Edit locally and push it upstream through the watcher path; the
    // render hash is deliberately left stale.
    ws.write_env("DB_PASSWORD=newpass\nPORT=8080\n");
    sync_local_now(&h.ctx, &ws.env_path).unwrap();

    run_pass(&h.ctx).unwrap();

    assert!(h.ctx.store.list_open_conflicts().unwrap().is_empty());
    assert_eq!(ws.read_env(), "DB_PASSWORD=newpass\nPORT=8080\n");

    let context = h
        .ctx
        .store
        .destination_context(&ws.env_path)
        .unwrap()
        .unwrap();
    let disk_hash = vault_fs::hash_content(&ws.read_env());
    assert_eq!(context.last_render_hash.as_deref(), Some(disk_hash.as_str()));
    assert_eq!(context.last_local_hash.as_deref(), Some(disk_hash.as_str()));
}

#[test]
fn recent_engine_write_suppresses_the_change_handler() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();

    let context = h
        .ctx
        .store
        .destination_context(&ws.env_path)
        .unwrap()
        .unwrap();
    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let secret_id = project.secret_id.unwrap();

    // An event right after the engine's own write is dropped
    h.ctx
        .store
        .update_destination(
            &context.destination_id,
            DestinationUpdate {
                last_tool_write_at: Some(vault_store::now_millis()),
                ..Default::default()
            },
        )
        .unwrap();
    ws.write_env("DB_PASSWORD=edited\nPORT=8080\n");
    handle_local_change(&h.ctx, &ws.env_path).unwrap();
    assert_eq!(
        h.ctx.secrets.get_blob(&secret_id, None).unwrap(),
        blob(&[("DB_PASSWORD", "secret")])
    );

    // The same event outside the window propagates
    h.ctx
        .store
        .update_destination(
            &context.destination_id,
            DestinationUpdate {
                last_tool_write_at: Some(vault_store::now_millis() - 60_000),
                ..Default::default()
            },
        )
        .unwrap();
    handle_local_change(&h.ctx, &ws.env_path).unwrap();
    assert_eq!(
        h.ctx.secrets.get_blob(&secret_id, None).unwrap(),
        blob(&[("DB_PASSWORD", "edited")])
    );
}

#[test]
fn edit_after_engine_render_still_reaches_the_blob() {
    let settings = SyncSettings {
        debounce_ms: 50,
        loop_window_ms: 100,
        refresh_interval_ms: 200,
        ..SyncSettings::default()
    };
    let h = Harness::with_settings(settings);
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();

    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let secret_id = project.secret_id.unwrap();

    let (ctx, _data) = h.into_parts();
    let ctx = Arc::new(ctx);
    let watcher = LocalWatcher::start(Arc::clone(&ctx)).unwrap();

    // The first pass rewrites the destination through a temp-then-rename,
    // replacing its inode; the watch has to survive that.
    run_pass(&ctx).unwrap();
    assert_eq!(ws.read_env(), "DB_PASSWORD=secret\nPORT=8080\n");

    // Step past the loop-suppression window, then edit like a user would
    std::thread::sleep(Duration::from_millis(150));
    ws.write_env("DB_PASSWORD=edited-by-user\nPORT=8080\n");

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let stored = ctx.secrets.get_blob(&secret_id, None).unwrap();
        if stored.get("DB_PASSWORD").map(String::as_str) == Some("edited-by-user") {
            break;
        }
        assert!(
            Instant::now() < deadline,
            "edit after the render never reached the blob"
        );
        std::thread::sleep(Duration::from_millis(50));
    }
    watcher.stop();
}

#[cfg(unix)]
#[test]
fn sync_accepts_a_symlinked_spelling_of_a_tracked_path() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();

    let links = tempfile::tempdir().unwrap();
    let link_dir = links.path().join("work");
    std::os::unix::fs::symlink(ws.env_path.parent().unwrap(), &link_dir).unwrap();

    ws.write_env("DB_PASSWORD=rotated\nPORT=8080\n");
    sync_local_now(&h.ctx, &link_dir.join(".env")).unwrap();

    let project = h.ctx.store.list_projects().unwrap().remove(0);
    let stored = h
        .ctx
        .secrets
        .get_blob(project.secret_id.as_deref().unwrap(), None)
        .unwrap();
    assert_eq!(stored, blob(&[("DB_PASSWORD", "rotated")]));
}

#[test]
fn engine_starts_and_stops_cleanly() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);
    add_file(&h.ctx, &ws.env_path, AddFileOptions::default()).unwrap();

    let (ctx, _data) = h.into_parts();
    let mut engine = vault_core::SyncEngine::new(ctx);
    engine.start().unwrap();
    // A second start is a no-op
    engine.start().unwrap();
    engine.poll_now().unwrap();
    engine.stop();
}

#[test]
fn untracked_path_is_rejected() {
    let h = Harness::new();
    let ws = Workspace::with_env(MARKED_ENV);

    let err = sync_local_now(&h.ctx, &ws.env_path).unwrap_err();
    assert!(matches!(err, vault_core::Error::NotTracked { .. }));
}
