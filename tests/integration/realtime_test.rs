//! Integration tests for live event delivery.

mod helpers;

use chrono::Utc;

use puddle_core::error::ErrorKind;
use puddle_core::types::{GrantKind, PermissionKind, UserId};
use puddle_realtime::message::OutboundMessage;

fn observe(path: &str) -> String {
    serde_json::json!({ "type": "observe", "path": path }).to_string()
}

#[tokio::test]
async fn test_handshake_rejects_bad_tokens() {
    let t = helpers::TestApp::new();
    t.create_user("alice").await;

    let err = t.app.realtime.connect("not-a-token").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let now = Utc::now().timestamp();
    let stale = t
        .app
        .issuer
        .issue_with_expiry(&UserId::from("alice"), now - 7200, now - 3600)
        .unwrap();
    let err = t.app.realtime.connect(&stale).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExpiredToken);

    assert_eq!(t.app.realtime.connections.connection_count(), 0);
}

#[tokio::test]
async fn test_observer_follows_renamed_directory() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let bob = t.create_user("bob").await;
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();

    let (conn, mut rx) = t.connect("bob").await;
    t.app.realtime.handle_inbound(&conn.id, &observe(&docs)).await;
    let greeting = helpers::drain(&mut rx);
    assert!(matches!(greeting[0], OutboundMessage::Connected { .. }));
    assert!(greeting.contains(&OutboundMessage::Observing { path: docs.clone() }));

    t.upload(&alice, &docs, "x", "1").await;
    let seen = helpers::drain(&mut rx);
    assert!(seen.contains(&OutboundMessage::Modified { path: docs.clone() }));
    assert!(seen.contains(&OutboundMessage::PermissionChanged {
        path: "alice/docs/x".to_string(),
        user_id: bob.user_id.clone(),
        kind: PermissionKind::Read,
        granted: true,
    }));

    t.app
        .drops
        .move_drop(&alice, &docs, "alice/", Some("papers"))
        .await
        .unwrap();
    let seen = helpers::drain(&mut rx);
    assert!(seen.contains(&OutboundMessage::Redefined {
        path: docs.clone(),
        new_path: "alice/papers/".to_string(),
    }));

    t.upload(&alice, "alice/papers/", "y", "2").await;
    let seen = helpers::drain(&mut rx);
    assert!(seen.contains(&OutboundMessage::Modified {
        path: "alice/papers/".to_string()
    }));
    assert!(!seen.contains(&OutboundMessage::Modified { path: docs }));
}

#[tokio::test]
async fn test_observe_requires_read() {
    let t = helpers::TestApp::new();
    t.create_user("alice").await;
    t.create_user("bob").await;

    let (conn, mut rx) = t.connect("bob").await;
    t.app
        .realtime
        .handle_inbound(&conn.id, &observe("alice/"))
        .await;

    let seen = helpers::drain(&mut rx);
    assert!(seen.iter().any(|msg| matches!(
        msg,
        OutboundMessage::Error { code, .. } if code == "FORBIDDEN"
    )));
    assert_eq!(t.app.realtime.topics.observation_count(conn.id), 0);
}

#[tokio::test]
async fn test_watcher_told_about_deletion() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let bob = t.create_user("bob").await;
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.app
        .sharing
        .grant(&alice, &docs, &bob.user_id, GrantKind::Read)
        .await
        .unwrap();

    let (_conn, mut rx) = t.connect("bob").await;
    t.app.watches.watch(&bob, &docs).await.unwrap();
    let seen = helpers::drain(&mut rx);
    assert!(seen.contains(&OutboundMessage::WatchAdded { path: docs.clone() }));

    t.app.drops.delete_drop(&alice, &docs).await.unwrap();
    let seen = helpers::drain(&mut rx);
    let notice = OutboundMessage::Notification {
        message: "alice/docs/ was deleted".to_string(),
    };
    let removed = OutboundMessage::WatchRemoved { path: docs.clone() };
    let notice_at = seen.iter().position(|m| m == &notice).unwrap();
    let removed_at = seen.iter().position(|m| m == &removed).unwrap();
    assert!(notice_at < removed_at);
}

#[tokio::test]
async fn test_stored_watches_joined_on_connect() {
    let t = helpers::TestApp::new();
    let alice = t.create_user("alice").await;
    let docs = t.mkdir(&alice, "alice/", "docs").await;
    t.app.watches.watch(&alice, &docs).await.unwrap();

    let (_conn, mut rx) = t.connect("alice").await;
    helpers::drain(&mut rx);

    t.mkdir(&alice, &docs, "inner").await;
    let seen = helpers::drain(&mut rx);
    assert!(seen.contains(&OutboundMessage::Notification {
        message: "The contents of alice/docs/ were modified".to_string(),
    }));

    let notified = t.app.watches.notify(&docs, "build finished").await.unwrap();
    assert_eq!(notified, 1);
    let seen = helpers::drain(&mut rx);
    assert_eq!(
        seen,
        vec![OutboundMessage::Notification {
            message: "build finished".to_string()
        }]
    );
}
