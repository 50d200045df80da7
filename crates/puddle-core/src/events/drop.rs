//! Drop change events.

use serde::{Deserialize, Serialize};

use crate::types::{PermissionKind, UserId};

/// Events describing a change to a drop path or its access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DropEvent {
    /// The drop at `path` (usually a directory listing) changed.
    Modified {
        /// Changed path.
        path: String,
    },
    /// The drop at `path` was removed.
    Deleted {
        /// Removed path.
        path: String,
    },
    /// The drop at `path` now lives at `new_path`.
    Redefined {
        /// Previous path.
        path: String,
        /// Current path.
        #[serde(rename = "newPath")]
        new_path: String,
    },
    /// A grant on `path` was added or removed.
    PermissionChanged {
        /// Path of the grant.
        path: String,
        /// Grantee.
        #[serde(rename = "userId")]
        user_id: UserId,
        /// Permission kind.
        kind: PermissionKind,
        /// `true` when granted, `false` when revoked.
        granted: bool,
    },
}

impl DropEvent {
    /// The path whose observers and watchers receive this event.
    pub fn path(&self) -> &str {
        match self {
            Self::Modified { path }
            | Self::Deleted { path }
            | Self::Redefined { path, .. }
            | Self::PermissionChanged { path, .. } => path,
        }
    }

    /// Human readable notice delivered to watchers of [`Self::path`].
    pub fn watcher_notice(&self) -> String {
        match self {
            Self::Modified { path } => format!("The contents of {path} were modified"),
            Self::Deleted { path } => format!("{path} was deleted"),
            Self::Redefined { path, new_path } => format!("{path} was moved to {new_path}"),
            Self::PermissionChanged {
                path,
                user_id,
                kind,
                granted: true,
            } => format!("{user_id} was granted {kind} permission on {path}"),
            Self::PermissionChanged {
                path,
                user_id,
                kind,
                granted: false,
            } => format!("{user_id} was refused {kind} permission on {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let event = DropEvent::Redefined {
            path: "alice/docs/".into(),
            new_path: "alice/papers/".into(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "redefined");
        assert_eq!(json["newPath"], "alice/papers/");

        let event = DropEvent::PermissionChanged {
            path: "alice/docs/".into(),
            user_id: UserId::from("bob"),
            kind: PermissionKind::Read,
            granted: true,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "permissionChanged");
        assert_eq!(json["userId"], "bob");
        assert_eq!(json["kind"], "read");
    }

    #[test]
    fn test_watcher_notice() {
        let event = DropEvent::Deleted {
            path: "alice/a.txt".into(),
        };
        assert_eq!(event.watcher_notice(), "alice/a.txt was deleted");
        assert_eq!(event.path(), "alice/a.txt");
    }
}
