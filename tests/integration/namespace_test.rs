//! Integration tests for namespace restructuring through the drop service.

mod helpers;

use bytes::Bytes;

use puddle_core::error::ErrorKind;
use puddle_core::types::{GrantFilter, GrantKind, PermissionKind, UserId};

#[tokio::test]
async fn test_delete_directory_cascades() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob = t.as_user("bob");

    let a = t.mkdir(&alice, "alice/", "a").await;
    let b = t.mkdir(&alice, &a, "b").await;
    let f = t.upload(&alice, &b, "f", "hello").await;
    let other = t.mkdir(&alice, "alice/", "other").await;

    t.app
        .sharing
        .grant(&alice, &a, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();
    t.app.watches.watch(&bob, &f).await.unwrap();

    let removed = t.app.drops.delete_drop(&alice, &a).await.unwrap();
    assert_eq!(removed, 3);

    for path in [&a, &b, &f] {
        assert!(!t.exists(path).await, "{path} should be gone");
    }
    assert!(t.exists(&other).await);
    assert!(t.exists("alice/").await);

    let perms = &t.app.stores.permissions;
    assert!(perms.list_subtree(&a).await.unwrap().is_empty());
    assert!(!perms.list(&GrantFilter::on(other.as_str())).await.unwrap().is_empty());
    assert!(t.app.watches.list(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_rewrites_descendants() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob = t.as_user("bob");

    let b = t.mkdir(&alice, "alice/", "b").await;
    let f = t.upload(&alice, &b, "f", "data").await;
    let untouched = t.mkdir(&alice, "alice/", "bb").await;
    t.app
        .sharing
        .grant(&alice, &b, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();
    t.app.watches.watch(&bob, &f).await.unwrap();

    let moved = t
        .app
        .drops
        .move_drop(&alice, &b, "alice/", Some("c"))
        .await
        .unwrap();
    assert_eq!(moved, "alice/c/");

    assert!(t.exists("alice/c/").await);
    assert!(t.exists("alice/c/f").await);
    assert!(!t.exists(&b).await);
    assert!(!t.exists(&f).await);
    assert!(t.exists(&untouched).await);

    let perms = &t.app.stores.permissions;
    assert!(
        perms
            .check("alice/c/f", &bob.user_id, PermissionKind::Read)
            .await
            .unwrap()
            .is_some()
    );
    assert!(perms.list_subtree(&b).await.unwrap().is_empty());

    let watches = t.app.watches.list(&bob).await.unwrap();
    assert_eq!(watches.len(), 1);
    assert_eq!(watches[0].path, "alice/c/f");

    assert_eq!(t.blob_size("alice/c/f").await, 4);
    assert_eq!(t.blob_size(&f).await, 0);
}

#[tokio::test]
async fn test_move_into_own_subtree_rejected() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let a = t.mkdir(&alice, "alice/", "a").await;
    let b = t.mkdir(&alice, &a, "b").await;

    let err = t.app.drops.move_drop(&alice, &a, &b, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
    assert!(t.exists(&a).await);
}

#[tokio::test]
async fn test_create_twice_reports_existing() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let first = t.app.drops.create_directory(&alice, "alice/", "docs").await.unwrap();

    let err = t
        .app
        .drops
        .create_directory(&alice, "alice/", "docs")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);

    let stored = t.app.stores.entries.get("alice/docs/").await.unwrap().unwrap();
    assert_eq!(stored.created_at, first.created_at);
    assert_eq!(stored.owner_id, first.owner_id);
}

#[tokio::test]
async fn test_copy_is_independent_of_source() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let b = t.mkdir(&alice, "alice/", "b").await;
    t.upload(&alice, &b, "f", "payload").await;

    let copied = t.app.drops.copy_drop(&alice, &b, "alice/d/").await.unwrap();
    assert_eq!(copied, 2);
    assert!(t.exists("alice/d/").await);
    assert!(t.exists("alice/d/f").await);

    t.app.drops.delete_drop(&alice, &b).await.unwrap();
    assert!(!t.exists(&b).await);
    assert!(t.exists("alice/d/").await);
    assert!(t.exists("alice/d/f").await);
    assert_eq!(t.blob_size("alice/d/f").await, 7);
}

#[tokio::test]
async fn test_copy_kind_mismatch_rejected() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let b = t.mkdir(&alice, "alice/", "b").await;

    let err = t.app.drops.copy_drop(&alice, &b, "alice/file").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
}

#[tokio::test]
async fn test_puddle_root_cannot_be_deleted() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;

    let err = t.app.drops.delete_drop(&alice, "alice/").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
    assert!(t.exists("alice/").await);
}

#[tokio::test]
async fn test_write_required_to_restructure() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob = t.as_user("bob");
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();

    let err = t.app.drops.delete_drop(&bob, &docs).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);

    let err = t
        .app
        .drops
        .create_directory(&bob, &docs, "inner")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);

    let listed = t.app.drops.contents(&bob, &docs).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_move_into_foreign_puddle_transfers_ownership() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let bob = t.create_user("bob").await;
    let inbox = t.mkdir(&bob, "bob/", "inbox").await;
    t.app
        .sharing
        .grant(&bob, &inbox, &alice.user_id, GrantKind::Write)
        .await
        .unwrap();

    let report = t.mkdir(&alice, "alice/", "report").await;
    t.upload(&alice, &report, "r.txt", "numbers").await;

    let moved = t
        .app
        .drops
        .move_drop(&alice, &report, &inbox, None)
        .await
        .unwrap();
    assert_eq!(moved, "bob/inbox/report/");

    let bob_id = UserId::from("bob");
    for path in ["bob/inbox/report/", "bob/inbox/report/r.txt"] {
        let drop = t.app.stores.entries.get(path).await.unwrap().unwrap();
        assert_eq!(drop.owner_id, bob_id);
        let kinds = t.app.stores.permissions.check(path, &bob_id, PermissionKind::Modify);
        assert!(kinds.await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_repair_reports_clean_namespace() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.app.watches.watch(&alice, &docs).await.unwrap();

    let report = t.app.namespace.repair("alice/").await.unwrap();
    assert_eq!(report.grants_removed, 0);
    assert_eq!(report.watches_removed, 0);
}

#[tokio::test]
async fn test_same_name_of_other_kind_is_refused_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let t = helpers::TestApp::on_disk(dir.path()).await;
    let alice = t.create_user("alice").await;
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.upload(&alice, &docs, "inner", "kept").await;
    let notes = t.upload(&alice, "alice/", "notes", "keep").await;

    let err = t
        .app
        .drops
        .create_directory(&alice, "alice/", "notes")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
    assert!(!t.exists("alice/notes/").await);

    let err = t
        .app
        .drops
        .register_upload(&alice, "alice/", "docs", Bytes::from_static(b"clobber"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
    assert!(!t.exists("alice/docs").await);

    let err = t
        .app
        .drops
        .move_drop(&alice, &notes, "alice/", Some("docs"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);

    let err = t
        .app
        .drops
        .copy_drop(&alice, &docs, "alice/notes/")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);

    assert!(t.exists(&notes).await);
    assert!(t.exists("alice/docs/inner").await);
    assert_eq!(t.blob_size(&notes).await, 4);
    assert_eq!(t.blob_size("alice/docs/inner").await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_keep_the_winner_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let t = helpers::TestApp::on_disk(dir.path()).await;
    let alice = t.create_user("alice").await;

    let mut tasks = Vec::new();
    for i in 0..16usize {
        let drops = t.app.drops.clone();
        let alice = alice.clone();
        tasks.push(tokio::spawn(async move {
            drops
                .register_upload(&alice, "alice/", "race.txt", Bytes::from(vec![b'r'; i + 1]))
                .await
        }));
    }

    let mut winners = Vec::new();
    for (i, task) in tasks.into_iter().enumerate() {
        match task.await.unwrap() {
            Ok(drop) => {
                assert_eq!(drop.path, "alice/race.txt");
                winners.push(i);
            }
            Err(e) => assert_eq!(e.kind, ErrorKind::AlreadyExists),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(t.blob_size("alice/race.txt").await, winners[0] as u64 + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_directory_and_file_of_one_name() {
    let dir = tempfile::tempdir().unwrap();
    let t = helpers::TestApp::on_disk(dir.path()).await;
    let alice = t.create_user("alice").await;

    for round in 0..10 {
        let name = format!("n{round}");
        let mkdir = {
            let drops = t.app.drops.clone();
            let alice = alice.clone();
            let name = name.clone();
            tokio::spawn(async move { drops.create_directory(&alice, "alice/", &name).await })
        };
        let upload = {
            let drops = t.app.drops.clone();
            let alice = alice.clone();
            let name = name.clone();
            tokio::spawn(async move {
                drops
                    .register_upload(&alice, "alice/", &name, Bytes::from_static(b"abc"))
                    .await
            })
        };
        let made_dir = mkdir.await.unwrap();
        let made_file = upload.await.unwrap();
        assert!(made_dir.is_ok() != made_file.is_ok(), "round {round}");

        let dir_path = format!("alice/{name}/");
        let file_path = format!("alice/{name}");
        if made_dir.is_ok() {
            assert_eq!(made_file.unwrap_err().kind, ErrorKind::AlreadyExists);
            assert!(t.exists(&dir_path).await);
            assert!(!t.exists(&file_path).await);
        } else {
            assert_eq!(made_dir.unwrap_err().kind, ErrorKind::AlreadyExists);
            assert!(t.exists(&file_path).await);
            assert!(!t.exists(&dir_path).await);
            assert_eq!(t.blob_size(&file_path).await, 3);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_onto_one_target() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let a = t.mkdir(&alice, "alice/", "a").await;
    let b = t.mkdir(&alice, "alice/", "b").await;
    t.upload(&alice, &a, "from_a", "1").await;
    t.upload(&alice, &b, "from_b", "22").await;

    let mut tasks = Vec::new();
    for source in [a.clone(), b.clone()] {
        let drops = t.app.drops.clone();
        let alice = alice.clone();
        tasks.push(tokio::spawn(async move {
            drops.move_drop(&alice, &source, "alice/", Some("c")).await
        }));
    }
    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);

    let (moved, stayed, moved_file, stayed_file) = if outcomes[0].is_ok() {
        (&a, &b, "from_a", "from_b")
    } else {
        (&b, &a, "from_b", "from_a")
    };
    assert!(!t.exists(moved).await);
    assert!(t.exists(&format!("alice/c/{moved_file}")).await);
    assert!(t.exists(stayed).await);
    assert!(t.exists(&format!("{stayed}{stayed_file}")).await);
    assert!(!t.exists(&format!("alice/c/{stayed_file}")).await);

    let contents = t.app.drops.contents(&alice, "alice/c/").await.unwrap();
    assert_eq!(contents.len(), 1);
}
