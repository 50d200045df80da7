//! Integration tests for account creation and removal.

mod helpers;

use puddle_core::error::ErrorKind;
use puddle_core::types::{GrantFilter, GrantKind, UserId};

#[tokio::test]
async fn test_create_account_owns_root() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;

    let root = t.app.stores.entries.get("alice/").await.unwrap().unwrap();
    assert_eq!(root.owner_id, alice.user_id);
    assert!(root.is_puddle_root());
    assert!(t.app.accounts.exists(&alice.user_id).await.unwrap());

    let err = t.app.accounts.create(&alice.user_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_delete_account_clears_everything() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let bob = t.create_user("bob").await;

    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.upload(&alice, &docs, "a.txt", "abc").await;
    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();
    t.app.watches.watch(&bob, &docs).await.unwrap();

    let shared = t.mkdir(&bob, "bob/", "shared").await;
    t.app
        .sharing
        .grant(&bob, &shared, &alice.user_id, GrantKind::Write)
        .await
        .unwrap();
    t.app.watches.watch(&alice, &shared).await.unwrap();

    let removal = t.app.accounts.delete(&alice.user_id).await.unwrap();
    assert_eq!(removal.entries, 3);

    assert!(!t.exists("alice/").await);
    assert!(!t.exists("alice/docs/a.txt").await);
    assert!(!t.app.accounts.exists(&alice.user_id).await.unwrap());
    assert_eq!(t.blob_size("alice/").await, 0);

    let perms = &t.app.stores.permissions;
    assert!(perms.list_subtree("alice/").await.unwrap().is_empty());
    let on_shared = perms
        .list(&GrantFilter::on(shared.as_str()).user(Some(alice.user_id.clone())))
        .await
        .unwrap();
    assert!(on_shared.is_empty());

    assert!(t.app.watches.list(&bob).await.unwrap().is_empty());
    assert!(t.app.watches.list(&alice).await.unwrap().is_empty());
    assert!(t.exists(&shared).await);
}

#[tokio::test]
async fn test_delete_unknown_account() {
    let t = helpers::TestApp::new();
    let err = t
        .app
        .accounts
        .delete(&UserId::from("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_account_can_be_recreated() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    t.mkdir(&alice, "alice/", "old").await;
    t.app.accounts.delete(&alice.user_id).await.unwrap();

    let alice = t.create_user("alice").await;
    let contents = t.app.drops.contents(&alice, "alice/").await.unwrap();
    assert!(contents.is_empty());
}

#[tokio::test]
async fn test_create_rejects_unchecked_ids() {
    let t = helpers::TestApp::new();
    t.create_user("alice").await;

    for raw in ["alice/x", "", ".."] {
        let err = t.app.accounts.create(&UserId::from(raw)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "{raw:?}");
    }
    assert!(!t.exists("alice/x/").await);
    let contents = t
        .app
        .drops
        .contents(&t.as_user("alice"), "alice/")
        .await
        .unwrap();
    assert!(contents.is_empty());
}
