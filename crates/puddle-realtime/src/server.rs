//! Top-level real-time engine: handshake, inbound routing, sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use puddle_auth::AccessChecker;
use puddle_core::config::RealtimeConfig;
use puddle_core::result::AppResult;
use puddle_core::traits::{Authenticator, EventPublisher};
use puddle_database::WatchStore;

use crate::bus::EventBus;
use crate::channel::{Topic, TopicRegistry};
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::manager::ConnectionManager;
use crate::connection::sweeper;
use crate::message::types::OutboundMessage;
use crate::metrics::{EngineMetrics, MetricsSnapshot};

/// Ties the topic registry, connection manager and event bus together.
#[derive(Clone)]
pub struct RealtimeEngine {
    pub connections: Arc<ConnectionManager>,
    pub topics: Arc<TopicRegistry>,
    pub bus: Arc<EventBus>,
    pub metrics: Arc<EngineMetrics>,
    authenticator: Arc<dyn Authenticator>,
    watches: Arc<dyn WatchStore>,
    config: RealtimeConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.connections.connection_count())
            .field("topics", &self.topics.topic_count())
            .finish()
    }
}

impl RealtimeEngine {
    pub fn new(
        config: RealtimeConfig,
        authenticator: Arc<dyn Authenticator>,
        watches: Arc<dyn WatchStore>,
        access: AccessChecker,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let metrics = Arc::new(EngineMetrics::new());
        let topics = Arc::new(TopicRegistry::new());
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            topics.clone(),
            access,
            metrics.clone(),
        ));
        let bus = Arc::new(EventBus::new(
            topics.clone(),
            connections.clone(),
            metrics.clone(),
        ));

        info!("Real-time engine initialized");
        Self {
            connections,
            topics,
            bus,
            metrics,
            authenticator,
            watches,
            config,
            shutdown_tx,
        }
    }

    /// The bus as the namespace engine sees it.
    pub fn publisher(&self) -> Arc<dyn EventPublisher> {
        self.bus.clone()
    }

    /// Authenticates `token` and registers a connection.
    ///
    /// Fails with `InvalidToken` or `ExpiredToken` before anything is
    /// registered. The connection is registered before the stored watches
    /// are listed, so a watch added meanwhile reaches it through the bus.
    pub async fn connect(
        &self,
        token: &str,
    ) -> AppResult<(Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>)> {
        let identity = match self.authenticator.resolve(token).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Rejected connection handshake");
                return Err(e);
            }
        };
        let (handle, rx) = self.connections.register(identity.user_id, &[]);

        let watches = match self.watches.list(&handle.user_id).await {
            Ok(watches) => watches,
            Err(e) => {
                warn!(conn_id = %handle.id, error = %e, "Could not load stored watches");
                self.connections.deregister(&handle.id);
                return Err(e);
            }
        };
        for watch in watches {
            self.topics
                .subscribe(&Topic::PathWatchers(watch.path), handle.id);
        }
        Ok((handle, rx))
    }

    /// Routes one raw client message.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw_message: &str) {
        self.connections.handle_inbound(conn_id, raw_message).await;
    }

    /// Ends a connection.
    pub fn disconnect(&self, conn_id: &ConnectionId) -> bool {
        self.connections.deregister(conn_id)
    }

    /// Starts the stale-connection sweeper.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        sweeper::spawn_sweeper(
            self.connections.clone(),
            Duration::from_secs(self.config.sweep_interval_seconds.max(1)),
            self.shutdown_tx.subscribe(),
        )
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stops background tasks and closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use puddle_core::AppError;
    use puddle_core::ErrorKind;
    use puddle_core::traits::Identity;
    use puddle_core::types::UserId;
    use puddle_database::Stores;
    use puddle_entity::watch::Watch;
    use tokio::sync::Notify;

    use super::*;

    /// Accepts tokens of the form `user:<uid>`.
    #[derive(Debug)]
    struct PrefixAuthenticator;

    #[async_trait]
    impl Authenticator for PrefixAuthenticator {
        async fn resolve(&self, token: &str) -> AppResult<Identity> {
            let uid = token
                .strip_prefix("user:")
                .ok_or_else(|| AppError::invalid_token("unknown token"))?;
            Ok(Identity {
                user_id: UserId::parse(uid)?,
            })
        }
    }

    /// Watch store whose `list` waits until the gate opens.
    #[derive(Debug)]
    struct GatedWatches {
        inner: Arc<dyn WatchStore>,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl WatchStore for GatedWatches {
        async fn add(&self, user_id: &UserId, path: &str) -> AppResult<bool> {
            self.inner.add(user_id, path).await
        }
        async fn remove(&self, user_id: &UserId, path: &str) -> AppResult<bool> {
            self.inner.remove(user_id, path).await
        }
        async fn remove_all_for_path(&self, path: &str) -> AppResult<Vec<Watch>> {
            self.inner.remove_all_for_path(path).await
        }
        async fn remove_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<Watch>> {
            self.inner.remove_all_for_user(user_id).await
        }
        async fn list(&self, user_id: &UserId) -> AppResult<Vec<Watch>> {
            self.gate.notified().await;
            self.inner.list(user_id).await
        }
        async fn list_watchers(&self, path: &str) -> AppResult<Vec<Watch>> {
            self.inner.list_watchers(path).await
        }
        async fn list_subtree(&self, path: &str) -> AppResult<Vec<Watch>> {
            self.inner.list_subtree(path).await
        }
        async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64> {
            self.inner.rename(old_path, new_path).await
        }
    }

    fn engine(stores: &Stores) -> RealtimeEngine {
        RealtimeEngine::new(
            RealtimeConfig::default(),
            Arc::new(PrefixAuthenticator),
            stores.watches.clone(),
            AccessChecker::new(stores.permissions.clone()),
        )
    }

    #[tokio::test]
    async fn test_handshake_rejects_bad_token() {
        let stores = Stores::memory();
        let engine = engine(&stores);
        let err = engine.connect("garbage").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
        assert_eq!(engine.connections.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_handshake_joins_stored_watches() {
        let stores = Stores::memory();
        let bob = UserId::from("bob");
        stores.watches.add(&bob, "alice/a.txt").await.expect("watch");
        let engine = engine(&stores);

        let (conn, mut rx) = engine.connect("user:bob").await.expect("connect");
        assert!(matches!(rx.recv().await, Some(OutboundMessage::Connected { .. })));

        engine.publisher().publish_modified("alice/a.txt");
        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Notification {
                message: "The contents of alice/a.txt were modified".into()
            })
        );

        assert!(engine.disconnect(&conn.id));
        assert_eq!(engine.metrics_snapshot().connections_active, 0);
    }

    #[tokio::test]
    async fn test_watch_added_during_handshake_reaches_connection() {
        let stores = Stores::memory();
        let gate = Arc::new(Notify::new());
        let engine = RealtimeEngine::new(
            RealtimeConfig::default(),
            Arc::new(PrefixAuthenticator),
            Arc::new(GatedWatches {
                inner: stores.watches.clone(),
                gate: gate.clone(),
            }),
            AccessChecker::new(stores.permissions.clone()),
        );
        let bob = UserId::from("bob");

        let (connected, ()) = tokio::join!(engine.connect("user:bob"), async {
            tokio::time::timeout(Duration::from_secs(5), async {
                while engine.connections.connection_count() == 0 {
                    tokio::task::yield_now().await;
                }
            })
            .await
            .expect("registered before stored watches are read");
            stores.watches.add(&bob, "alice/a.txt").await.expect("watch");
            engine.publisher().watch_added(&bob, "alice/a.txt");
            gate.notify_one();
        });
        let (_conn, mut rx) = connected.expect("connect");

        engine.publisher().publish_modified("alice/a.txt");
        let mut seen = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            seen.push(msg);
        }
        assert!(matches!(seen[0], OutboundMessage::Connected { .. }));
        assert!(seen.contains(&OutboundMessage::WatchAdded {
            path: "alice/a.txt".into()
        }));
        let modified = OutboundMessage::Notification {
            message: "The contents of alice/a.txt were modified".into(),
        };
        assert_eq!(seen.iter().filter(|m| **m == modified).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_shutdown() {
        let stores = Stores::memory();
        let engine = engine(&stores);
        let (_conn, mut rx) = engine.connect("user:alice").await.expect("connect");
        let _ = rx.recv().await;

        let task = engine.spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(rx.recv().await, Some(OutboundMessage::Ping { .. })));

        engine.shutdown();
        task.await.expect("sweeper task");
        assert_eq!(engine.connections.connection_count(), 0);
    }
}
