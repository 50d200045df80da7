//! Inbound and outbound message definitions.

use serde::{Deserialize, Serialize};

use puddle_core::events::{DropEvent, WatchEvent};
use puddle_core::types::{PermissionKind, UserId};

use crate::connection::handle::ConnectionId;

/// Messages sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Start receiving events for `path`.
    Observe { path: String },
    /// Stop receiving events for `path`.
    Unobserve { path: String },
    /// Reply to a server ping.
    Pong {
        /// Echoed timestamp.
        timestamp: i64,
    },
}

/// Messages delivered to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Handshake accepted.
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// Observation confirmed.
    Observing { path: String },
    /// Observation ended.
    Unobserved { path: String },
    Modified { path: String },
    Deleted { path: String },
    Redefined {
        path: String,
        #[serde(rename = "newPath")]
        new_path: String,
    },
    PermissionChanged {
        path: String,
        #[serde(rename = "userId")]
        user_id: UserId,
        kind: PermissionKind,
        granted: bool,
    },
    /// Human readable notice.
    Notification { message: String },
    WatchAdded { path: String },
    WatchRemoved { path: String },
    /// Keepalive; clients answer with a pong.
    Ping {
        /// Server time in milliseconds.
        timestamp: i64,
    },
    Error { code: String, message: String },
}

impl OutboundMessage {
    /// Builds an error message.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<DropEvent> for OutboundMessage {
    fn from(event: DropEvent) -> Self {
        match event {
            DropEvent::Modified { path } => Self::Modified { path },
            DropEvent::Deleted { path } => Self::Deleted { path },
            DropEvent::Redefined { path, new_path } => Self::Redefined { path, new_path },
            DropEvent::PermissionChanged {
                path,
                user_id,
                kind,
                granted,
            } => Self::PermissionChanged {
                path,
                user_id,
                kind,
                granted,
            },
        }
    }
}

impl From<WatchEvent> for OutboundMessage {
    fn from(event: WatchEvent) -> Self {
        match event {
            WatchEvent::WatchAdded { path } => Self::WatchAdded { path },
            WatchEvent::WatchRemoved { path } => Self::WatchRemoved { path },
            WatchEvent::Notification { message } => Self::Notification { message },
        }
    }
}
