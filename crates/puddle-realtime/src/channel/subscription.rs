//! Reverse index from connection to joined topics.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

/// Tracks which topics each connection has joined.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    by_connection: DashMap<ConnectionId, HashSet<String>>,
}

impl SubscriptionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a membership.
    pub fn add(&self, conn_id: ConnectionId, topic: String) {
        self.by_connection.entry(conn_id).or_default().insert(topic);
    }

    /// Forgets a membership.
    pub fn remove(&self, conn_id: ConnectionId, topic: &str) {
        if let Some(mut topics) = self.by_connection.get_mut(&conn_id) {
            topics.remove(topic);
        }
    }

    /// Number of topics whose name starts with `prefix` that `conn_id` has
    /// joined.
    pub fn count_with_prefix(&self, conn_id: ConnectionId, prefix: &str) -> usize {
        self.by_connection
            .get(&conn_id)
            .map(|topics| topics.iter().filter(|t| t.starts_with(prefix)).count())
            .unwrap_or(0)
    }

    /// Topics joined by `conn_id`.
    pub fn topics(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.by_connection
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Drops every membership of `conn_id` and returns the topics.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.by_connection
            .remove(&conn_id)
            .map(|(_, topics)| topics)
            .unwrap_or_default()
    }
}
