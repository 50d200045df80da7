//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use puddle_core::config::{AuthConfig, RealtimeConfig};
use puddle_core::traits::BlobStore;
use puddle_core::types::UserId;
use puddle_database::Stores;
use puddle_realtime::connection::ConnectionHandle;
use puddle_realtime::message::OutboundMessage;
use puddle_service::{AppServices, RequestContext};
use puddle_storage::providers::{LocalBlobStore, MemoryBlobStore};

/// Test application context backed by in-memory stores and blobs.
pub struct TestApp {
    pub app: AppServices,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        Self::with_blobs(Arc::new(MemoryBlobStore::new()))
    }

    /// Test application whose bytes live on disk under `root`.
    pub async fn on_disk(root: &Path) -> Self {
        let blobs = LocalBlobStore::new(&root.to_string_lossy())
            .await
            .expect("Failed to open local storage");
        Self::with_blobs(Arc::new(blobs))
    }

    fn with_blobs(blobs: Arc<dyn BlobStore>) -> Self {
        let auth = AuthConfig {
            jwt_secret: "integration-secret".to_string(),
            ..AuthConfig::default()
        };
        let app = AppServices::from_parts(Stores::memory(), blobs, &auth, RealtimeConfig::default());
        Self { app }
    }

    /// Create an account and return a request context acting as it.
    pub async fn create_user(&self, name: &str) -> RequestContext {
        let user_id = UserId::from(name);
        self.app
            .accounts
            .create(&user_id)
            .await
            .expect("Failed to create account");
        RequestContext::new(user_id)
    }

    pub fn as_user(&self, name: &str) -> RequestContext {
        RequestContext::new(UserId::from(name))
    }

    /// Create directory `name` inside `parent` as `ctx`, returning its path.
    pub async fn mkdir(&self, ctx: &RequestContext, parent: &str, name: &str) -> String {
        self.app
            .drops
            .create_directory(ctx, parent, name)
            .await
            .expect("Failed to create directory")
            .path
    }

    /// Upload file `name` inside `dir` as `ctx`, returning its path.
    pub async fn upload(&self, ctx: &RequestContext, dir: &str, name: &str, data: &str) -> String {
        self.app
            .drops
            .register_upload(ctx, dir, name, Bytes::from(data.to_string()))
            .await
            .expect("Failed to register upload")
            .path
    }

    /// Open a real-time connection for `name` with a freshly issued token.
    pub async fn connect(
        &self,
        name: &str,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let token = self
            .app
            .issuer
            .issue(&UserId::from(name))
            .expect("Failed to issue token");
        self.app
            .realtime
            .connect(&token)
            .await
            .expect("Failed to connect")
    }

    /// Whether the entry at `path` exists.
    pub async fn exists(&self, path: &str) -> bool {
        self.app
            .stores
            .entries
            .exists(path)
            .await
            .expect("Failed to query entries")
    }

    /// Stored bytes at `path`.
    pub async fn blob_size(&self, path: &str) -> u64 {
        self.app
            .namespace
            .blobs()
            .size(path)
            .await
            .expect("Failed to query blob size")
    }
}

/// Every message currently queued on `rx`.
pub fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}
