//! Event bus counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Messages queued on a connection.
    pub messages_sent: AtomicU64,
    /// Deliveries dropped on a full or closed buffer.
    pub messages_dropped: AtomicU64,
    /// Inbound client messages.
    pub messages_received: AtomicU64,
    /// Connections ever registered.
    pub connections_total: AtomicU64,
    /// Connections currently registered.
    pub connections_active: AtomicU64,
    /// Stale connections purged by the sweeper.
    pub connections_purged: AtomicU64,
    /// Drop events published.
    pub events_published: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one delivery attempt.
    pub fn delivery(&self, delivered: bool) {
        if delivered {
            self.messages_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.messages_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn connection_purged(&self) {
        self.connections_purged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_purged: self.connections_purged.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub messages_received: u64,
    pub connections_total: u64,
    pub connections_active: u64,
    pub connections_purged: u64,
    pub events_published: u64,
}
