//! Connection lifecycle: register, observe, deliver, purge.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use puddle_auth::AccessChecker;
use puddle_core::config::RealtimeConfig;
use puddle_core::types::{PermissionKind, UserId, path};

use crate::channel::{Topic, TopicRegistry};
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::EngineMetrics;

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Owns every live connection and its topic memberships.
#[derive(Debug)]
pub struct ConnectionManager {
    pool: ConnectionPool,
    topics: Arc<TopicRegistry>,
    access: AccessChecker,
    metrics: Arc<EngineMetrics>,
    config: RealtimeConfig,
}

impl ConnectionManager {
    pub fn new(
        config: RealtimeConfig,
        topics: Arc<TopicRegistry>,
        access: AccessChecker,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            pool: ConnectionPool::new(),
            topics,
            access,
            metrics,
            config,
        }
    }

    /// Registers an authenticated connection for `user_id`.
    ///
    /// Joins the user's identity topic and the watcher topic of every path
    /// in `watched_paths`. When the user is at the connection cap the oldest
    /// connection is evicted first.
    pub fn register(
        &self,
        user_id: UserId,
        watched_paths: &[String],
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(user_id.clone(), tx));

        let existing = self.pool.user_connections(&user_id);
        let cap = self.config.max_connections_per_user.max(1);
        if existing.len() >= cap {
            warn!(
                user_id = %user_id,
                count = existing.len(),
                max = cap,
                "User at max connections, evicting oldest"
            );
            for oldest in existing.iter().take(existing.len() + 1 - cap) {
                self.deregister(&oldest.id);
            }
        }

        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        self.topics
            .subscribe(&Topic::Identity(user_id.clone()), handle.id);
        for watched in watched_paths {
            self.topics
                .subscribe(&Topic::PathWatchers(watched.clone()), handle.id);
        }

        self.deliver(
            &handle,
            OutboundMessage::Connected {
                connection_id: handle.id,
                user_id: user_id.clone(),
            },
        );

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            watches = watched_paths.len(),
            "Connection registered"
        );
        (handle, rx)
    }

    /// Drops a connection and all of its memberships.
    pub fn deregister(&self, conn_id: &ConnectionId) -> bool {
        let Some(handle) = self.pool.remove(conn_id) else {
            return false;
        };
        handle.mark_dead();
        self.topics.unsubscribe_all(*conn_id);
        self.metrics.connection_closed();
        info!(conn_id = %conn_id, user_id = %handle.user_id, "Connection deregistered");
        true
    }

    /// Processes one raw client message.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw_message: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };
        self.metrics.message_received();

        let msg: InboundMessage = match serde_json::from_str(raw_message) {
            Ok(m) => m,
            Err(e) => {
                self.deliver(
                    &handle,
                    OutboundMessage::error("INVALID_MESSAGE", format!("Failed to parse message: {e}")),
                );
                return;
            }
        };

        match msg {
            InboundMessage::Observe { path } => self.observe(&handle, path).await,
            InboundMessage::Unobserve { path } => {
                self.topics
                    .unsubscribe(&Topic::PathObservers(path.clone()), handle.id);
                self.deliver(&handle, OutboundMessage::Unobserved { path });
            }
            InboundMessage::Pong { .. } => handle.record_pong(Utc::now()),
        }
    }

    /// Observing requires `read` on the path.
    async fn observe(&self, handle: &ConnectionHandle, target: String) {
        if let Err(e) = path::validate(&target) {
            self.deliver(handle, OutboundMessage::error("INVALID_PATH", e.message));
            return;
        }

        let max = self.config.max_observations_per_connection;
        if self.topics.observation_count(handle.id) >= max {
            self.deliver(
                handle,
                OutboundMessage::error(
                    "MAX_OBSERVATIONS",
                    format!("Maximum observations ({max}) reached"),
                ),
            );
            return;
        }

        match self
            .access
            .has(&target, &handle.user_id, PermissionKind::Read)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.deliver(
                    handle,
                    OutboundMessage::error("FORBIDDEN", format!("Not allowed to observe {target}")),
                );
                return;
            }
            Err(e) => {
                warn!(conn_id = %handle.id, error = %e, "Observe permission check failed");
                self.deliver(handle, OutboundMessage::error("INTERNAL", e.message));
                return;
            }
        }

        self.topics
            .subscribe(&Topic::PathObservers(target.clone()), handle.id);
        debug!(conn_id = %handle.id, path = %target, "Observing path");
        self.deliver(handle, OutboundMessage::Observing { path: target });
    }

    /// Joins every connection of `user_id` to `topic`.
    pub fn join_user(&self, user_id: &UserId, topic: &Topic) {
        for conn in self.pool.user_connections(user_id) {
            self.topics.subscribe(topic, conn.id);
        }
    }

    /// Removes every connection of `user_id` from `topic`.
    pub fn leave_user(&self, user_id: &UserId, topic: &Topic) {
        for conn in self.pool.user_connections(user_id) {
            self.topics.unsubscribe(topic, conn.id);
        }
    }

    /// Delivers `message` to every member of `topic`. Returns the number of
    /// connections it was queued on.
    pub fn send_to_topic(&self, topic: &Topic, message: &OutboundMessage) -> usize {
        self.topics
            .subscribers(topic)
            .iter()
            .filter_map(|conn_id| self.pool.get(conn_id))
            .filter(|handle| self.deliver(handle, message.clone()))
            .count()
    }

    /// Delivers `message` to every connection of `user_id`.
    pub fn send_to_user(&self, user_id: &UserId, message: &OutboundMessage) -> usize {
        self.send_to_topic(&Topic::Identity(user_id.clone()), message)
    }

    fn deliver(&self, handle: &ConnectionHandle, message: OutboundMessage) -> bool {
        let delivered = handle.send(message);
        self.metrics.delivery(delivered);
        delivered
    }

    /// Pings every live connection.
    pub fn ping_all(&self, now: DateTime<Utc>) {
        let ping = OutboundMessage::Ping {
            timestamp: now.timestamp_millis(),
        };
        for conn in self.pool.all_connections() {
            self.deliver(&conn, ping.clone());
        }
    }

    /// Deregisters every connection that is dead or has not answered a ping
    /// within `stale_after_seconds` as of `now`.
    pub fn purge_stale(&self, now: DateTime<Utc>) -> Vec<ConnectionId> {
        let window = chrono::Duration::seconds(self.config.stale_after_seconds as i64);
        let stale: Vec<ConnectionId> = self
            .pool
            .all_connections()
            .into_iter()
            .filter(|conn| conn.is_stale(now, window))
            .map(|conn| conn.id)
            .collect();

        for conn_id in &stale {
            if self.deregister(conn_id) {
                self.metrics.connection_purged();
                warn!(conn_id = %conn_id, "Purged stale connection");
            }
        }
        stale
    }

    /// Deregisters every connection.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.deregister(&conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Connections of `user_id`, oldest first.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.pool.user_connections(user_id)
    }
}
