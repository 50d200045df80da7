//! Fan-out of namespace events onto live topics.

use std::sync::Arc;

use tracing::debug;

use puddle_core::events::{DropEvent, WatchEvent};
use puddle_core::traits::EventPublisher;
use puddle_core::types::{UserId, path};

use crate::channel::{Topic, TopicRegistry};
use crate::connection::ConnectionManager;
use crate::message::types::OutboundMessage;
use crate::metrics::EngineMetrics;

/// The [`EventPublisher`] the namespace engine writes to.
///
/// Observers of a path receive the typed event, watchers receive a human
/// readable notice, and permission changes on someone else's tree also reach
/// the grantee's identity topic. Every delivery is a non-blocking queue push.
#[derive(Debug, Clone)]
pub struct EventBus {
    topics: Arc<TopicRegistry>,
    connections: Arc<ConnectionManager>,
    metrics: Arc<EngineMetrics>,
}

impl EventBus {
    pub fn new(
        topics: Arc<TopicRegistry>,
        connections: Arc<ConnectionManager>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            topics,
            connections,
            metrics,
        }
    }

    fn send_identity(&self, user_id: &UserId, event: WatchEvent) {
        self.connections
            .send_to_user(user_id, &OutboundMessage::from(event));
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: DropEvent) {
        self.metrics.event_published();
        let target = event.path().to_string();

        let notice = OutboundMessage::Notification {
            message: event.watcher_notice(),
        };
        let watchers = self
            .connections
            .send_to_topic(&Topic::PathWatchers(target.clone()), &notice);

        let grantee = match &event {
            DropEvent::PermissionChanged { user_id, .. } => Some(user_id.clone()),
            _ => None,
        };
        let message = OutboundMessage::from(event);
        let observers = self
            .connections
            .send_to_topic(&Topic::PathObservers(target.clone()), &message);

        if let Some(user_id) = grantee {
            if path::owner(&target) != user_id.as_str() {
                self.connections.send_to_user(&user_id, &message);
            }
        }

        debug!(path = %target, observers, watchers, "Published event");
    }

    fn watch_added(&self, user_id: &UserId, watched: &str) {
        self.connections
            .join_user(user_id, &Topic::PathWatchers(watched.to_string()));
        self.send_identity(
            user_id,
            WatchEvent::WatchAdded {
                path: watched.to_string(),
            },
        );
    }

    fn watch_removed(&self, user_id: &UserId, watched: &str) {
        self.connections
            .leave_user(user_id, &Topic::PathWatchers(watched.to_string()));
        self.send_identity(
            user_id,
            WatchEvent::WatchRemoved {
                path: watched.to_string(),
            },
        );
    }

    fn paths_rebased(&self, old_prefix: &str, new_prefix: &str) {
        self.topics.rebase(old_prefix, new_prefix);
    }

    fn notify_user(&self, user_id: &UserId, message: &str) {
        self.send_identity(
            user_id,
            WatchEvent::Notification {
                message: message.to_string(),
            },
        );
    }
}
