//! Event publication seam between the namespace engine and real-time fan-out.

use crate::events::DropEvent;
use crate::types::{PermissionKind, UserId};

/// Receives namespace events and topic membership changes.
///
/// Implementations must not block: the coordinator calls these while it
/// still holds namespace locks.
pub trait EventPublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Fan out a drop event to the observers and watchers of its path.
    fn publish(&self, event: DropEvent);

    /// A watch was stored for `user_id` on `path`.
    fn watch_added(&self, user_id: &UserId, path: &str);

    /// A watch was removed for `user_id` on `path`.
    fn watch_removed(&self, user_id: &UserId, path: &str);

    /// Every topic under `old_prefix` moved to `new_prefix`.
    fn paths_rebased(&self, old_prefix: &str, new_prefix: &str);

    /// Send a notice to every live connection of `user_id`.
    fn notify_user(&self, user_id: &UserId, message: &str);

    fn publish_modified(&self, path: &str) {
        self.publish(DropEvent::Modified {
            path: path.to_string(),
        });
    }

    fn publish_deleted(&self, path: &str) {
        self.publish(DropEvent::Deleted {
            path: path.to_string(),
        });
    }

    fn publish_redefined(&self, path: &str, new_path: &str) {
        self.publish(DropEvent::Redefined {
            path: path.to_string(),
            new_path: new_path.to_string(),
        });
    }

    fn publish_permission_changed(
        &self,
        path: &str,
        user_id: &UserId,
        kind: PermissionKind,
        granted: bool,
    ) {
        self.publish(DropEvent::PermissionChanged {
            path: path.to_string(),
            user_id: user_id.clone(),
            kind,
            granted,
        });
    }
}
