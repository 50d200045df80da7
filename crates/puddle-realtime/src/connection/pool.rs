//! Connections indexed by ID and by user.

use std::sync::Arc;

use dashmap::DashMap;

use puddle_core::types::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of live connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// User → connections, oldest first.
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_user
            .entry(handle.user_id.clone())
            .or_default()
            .push(handle);
    }

    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user
                    .remove_if(&handle.user_id, |_, conns| conns.is_empty());
            }
        }
        Some(handle)
    }

    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Connections of `user_id`, oldest first.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}
