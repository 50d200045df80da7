//! A single live connection.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{trace, warn};
use uuid::Uuid;

use puddle_core::types::UserId;

use crate::message::types::OutboundMessage;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to one authenticated connection.
///
/// Outbound delivery is a bounded channel drained by the transport. Sending
/// never waits: a full buffer drops the message, a closed one marks the
/// handle dead.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Connection ID.
    pub id: ConnectionId,
    /// Authenticated user.
    pub user_id: UserId,
    /// Outbound messages.
    sender: mpsc::Sender<OutboundMessage>,
    /// When the handshake completed.
    pub connected_at: DateTime<Utc>,
    /// Last pong, in milliseconds since the epoch.
    last_pong_ms: AtomicI64,
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Creates a handle for `user_id`.
    pub fn new(user_id: UserId, sender: mpsc::Sender<OutboundMessage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            sender,
            connected_at: now,
            last_pong_ms: AtomicI64::new(now.timestamp_millis()),
            alive: AtomicBool::new(true),
        }
    }

    /// Queues `msg` for delivery. Returns `false` if it was dropped.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(()) => {
                trace!(conn_id = %self.id, "Queued outbound message");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Send buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Records a pong received at `at`.
    pub fn record_pong(&self, at: DateTime<Utc>) {
        self.last_pong_ms
            .fetch_max(at.timestamp_millis(), Ordering::SeqCst);
    }

    /// When the last pong arrived.
    pub fn last_pong(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_pong_ms.load(Ordering::SeqCst))
            .single()
            .unwrap_or(self.connected_at)
    }

    /// Whether the connection is dead or silent for longer than
    /// `stale_after` as of `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        !self.is_alive() || now - self.last_pong() > stale_after
    }

    /// Serializable snapshot.
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            user_id: self.user_id.clone(),
            connected_at: self.connected_at,
            last_pong: self.last_pong(),
            alive: self.is_alive(),
        }
    }
}

/// Snapshot of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub connected_at: DateTime<Utc>,
    pub last_pong: DateTime<Utc>,
    pub alive: bool,
}
