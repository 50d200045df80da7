//! Integration tests for sharing grants across users.

mod helpers;

use puddle_core::error::ErrorKind;
use puddle_core::types::{GrantKind, PermissionKind, UserId};

#[tokio::test]
async fn test_share_survives_rename() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob = t.as_user("bob");

    let mut root_kinds: Vec<PermissionKind> = t
        .app
        .sharing
        .list(&alice, "alice/", Some(alice.user_id.clone()), GrantKind::All)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.kind)
        .collect();
    root_kinds.sort();
    assert_eq!(
        root_kinds,
        vec![PermissionKind::Read, PermissionKind::Write, PermissionKind::Modify]
    );

    let docs = t.mkdir(&alice, "alice/", "docs").await;
    assert_eq!(docs, "alice/docs/");
    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();

    let bob_grants = t
        .app
        .sharing
        .list(&bob, &docs, Some(bob.user_id.clone()), GrantKind::All)
        .await
        .unwrap();
    assert_eq!(bob_grants.len(), 1);
    assert_eq!(bob_grants[0].kind, PermissionKind::Read);

    t.app
        .drops
        .move_drop(&alice, &docs, "alice/", Some("papers"))
        .await
        .unwrap();

    let on_papers = t
        .app
        .sharing
        .list(&bob, "alice/papers/", Some(bob.user_id.clone()), GrantKind::All)
        .await
        .unwrap();
    assert_eq!(on_papers.len(), 1);
    assert_eq!(on_papers[0].kind, PermissionKind::Read);
    assert_eq!(on_papers[0].path, "alice/papers/");

    let on_docs = t
        .app
        .sharing
        .list(&bob, &docs, Some(bob.user_id.clone()), GrantKind::All)
        .await
        .unwrap();
    assert!(on_docs.is_empty());
}

#[tokio::test]
async fn test_grant_all_is_three_kinds_once() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob_id = UserId::from("bob");
    let docs = t.mkdir(&alice, "alice/", "docs").await;

    let first = t
        .app
        .sharing
        .grant(&alice, &docs, &bob_id, GrantKind::All)
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    let second = t
        .app
        .sharing
        .grant(&alice, &docs, &bob_id, GrantKind::All)
        .await
        .unwrap();
    assert!(second.is_empty());

    let mut kinds: Vec<PermissionKind> = t
        .app
        .sharing
        .list(&alice, &docs, Some(bob_id), GrantKind::All)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.kind)
        .collect();
    kinds.sort();
    assert_eq!(
        kinds,
        vec![PermissionKind::Read, PermissionKind::Write, PermissionKind::Modify]
    );
}

#[tokio::test]
async fn test_grant_reaches_existing_descendants() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob = t.as_user("bob");
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    let file = t.upload(&alice, &docs, "notes.txt", "n").await;

    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();

    let info = t.app.drops.info(&bob, &file).await.unwrap();
    assert_eq!(info.permissions, vec![PermissionKind::Read]);
    assert_eq!(info.size, 1);

    let later = t.mkdir(&alice, &docs, "later").await;
    assert!(t.app.drops.contents(&bob, &later).await.is_ok());
}

#[tokio::test]
async fn test_listing_others_requires_modify() {
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

    let err = t
        .app
        .sharing
        .list(&bob, &docs, None, GrantKind::All)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);

    let everyone = t
        .app
        .sharing
        .list(&alice, &docs, None, GrantKind::Read)
        .await
        .unwrap();
    assert_eq!(everyone.len(), 2);
}

#[tokio::test]
async fn test_revoke_rules() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.create_user("bob").await;
    let bob = t.as_user("bob");
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::All)
        .await
        .unwrap();

    let err = t
        .app
        .sharing
        .revoke(&bob, &docs, &alice.user_id, GrantKind::Read)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = t
        .app
        .sharing
        .grant(&alice, &docs, &UserId::from("mallory"), GrantKind::Read)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let revoked = t
        .app
        .sharing
        .revoke(&alice, &docs, &bob.user_id, GrantKind::Write)
        .await
        .unwrap();
    assert_eq!(revoked.len(), 1);

    let err = t
        .app
        .drops
        .create_directory(&bob, &docs, "inner")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientPermission);
    assert!(t.app.drops.contents(&bob, &docs).await.is_ok());
}
