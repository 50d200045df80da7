//! Watch lifecycle events and watcher notices.

use serde::{Deserialize, Serialize};

/// Events delivered on a user's identity topic about their watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WatchEvent {
    /// The user started watching `path`.
    WatchAdded { path: String },
    /// The user stopped watching `path`.
    WatchRemoved { path: String },
    /// A free-form notice for a watcher.
    Notification { message: String },
}
