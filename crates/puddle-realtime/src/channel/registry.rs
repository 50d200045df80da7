//! Topic registry: every topic and the connections joined to it.

use dashmap::DashMap;
use tracing::debug;

use puddle_core::types::path;

use crate::connection::handle::ConnectionId;

use super::channel::Channel;
use super::subscription::SubscriptionTracker;
use super::types::Topic;

/// Registry of live topic memberships.
///
/// Reads (fan-out) and writes (join/leave) go through sharded maps, so a
/// publisher never waits on a subscriber.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    /// Topic string → members.
    channels: DashMap<String, Channel>,
    /// Reverse index.
    subscriptions: SubscriptionTracker,
}

impl TopicRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins `conn_id` to `topic`. Returns `false` if it was already a member.
    pub fn subscribe(&self, topic: &Topic, conn_id: ConnectionId) -> bool {
        self.join(topic.to_topic_string(), conn_id)
    }

    fn join(&self, name: String, conn_id: ConnectionId) -> bool {
        let joined = self
            .channels
            .entry(name.clone())
            .or_insert_with(|| Channel::new(name.clone()))
            .join(conn_id);
        if joined {
            debug!(conn_id = %conn_id, topic = %name, "Joined topic");
            self.subscriptions.add(conn_id, name);
        }
        joined
    }

    /// Removes `conn_id` from `topic`. Returns `false` if it was not a member.
    pub fn unsubscribe(&self, topic: &Topic, conn_id: ConnectionId) -> bool {
        let name = topic.to_topic_string();
        let left = self.leave(&name, conn_id);
        self.subscriptions.remove(conn_id, &name);
        left
    }

    fn leave(&self, name: &str, conn_id: ConnectionId) -> bool {
        let mut left = false;
        if let Some(mut channel) = self.channels.get_mut(name) {
            left = channel.leave(conn_id);
            if channel.is_empty() {
                drop(channel);
                self.channels.remove_if(name, |_, ch| ch.is_empty());
            }
        }
        left
    }

    /// Removes `conn_id` from every topic it joined.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) {
        for name in self.subscriptions.remove_all(conn_id) {
            self.leave(&name, conn_id);
        }
    }

    /// Members of `topic`.
    pub fn subscribers(&self, topic: &Topic) -> Vec<ConnectionId> {
        self.channels
            .get(&topic.to_topic_string())
            .map(|ch| ch.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `conn_id` has joined `topic`.
    pub fn is_member(&self, topic: &Topic, conn_id: ConnectionId) -> bool {
        self.channels
            .get(&topic.to_topic_string())
            .is_some_and(|ch| ch.members.contains(&conn_id))
    }

    /// Number of paths `conn_id` is observing.
    pub fn observation_count(&self, conn_id: ConnectionId) -> usize {
        let prefix = Topic::PathObservers(String::new()).to_topic_string();
        self.subscriptions.count_with_prefix(conn_id, &prefix)
    }

    /// Moves the members of every path-keyed topic whose path lies within
    /// `old_prefix` onto the rebased path. Identity topics are untouched.
    ///
    /// Returns the number of topics moved.
    pub fn rebase(&self, old_prefix: &str, new_prefix: &str) -> usize {
        let mut moves = Vec::new();
        for entry in self.channels.iter() {
            for family in Topic::path_family_prefixes() {
                let Some(topic_path) = entry.key().strip_prefix(family) else {
                    continue;
                };
                if !path::is_within(topic_path, old_prefix) {
                    continue;
                }
                if let Some(rebased) = path::rebase(topic_path, old_prefix, new_prefix) {
                    moves.push((entry.key().clone(), format!("{family}{rebased}")));
                }
            }
        }

        for (old_name, new_name) in &moves {
            let Some((_, channel)) = self.channels.remove(old_name) else {
                continue;
            };
            for conn_id in channel.members {
                self.subscriptions.remove(conn_id, old_name);
                self.join(new_name.clone(), conn_id);
            }
        }

        if !moves.is_empty() {
            debug!(
                old_prefix = %old_prefix,
                new_prefix = %new_prefix,
                topics = moves.len(),
                "Rebased topics"
            );
        }
        moves.len()
    }

    /// Number of topics with at least one member.
    pub fn topic_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use puddle_core::types::UserId;

    use super::*;

    #[test]
    fn test_subscribe_and_leave() {
        let registry = TopicRegistry::new();
        let conn = Uuid::new_v4();
        let topic = Topic::PathObservers("alice/docs/".into());

        assert!(registry.subscribe(&topic, conn));
        assert!(!registry.subscribe(&topic, conn));
        assert_eq!(registry.subscribers(&topic), vec![conn]);
        assert_eq!(registry.observation_count(conn), 1);

        assert!(registry.unsubscribe(&topic, conn));
        assert!(registry.subscribers(&topic).is_empty());
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_unsubscribe_all() {
        let registry = TopicRegistry::new();
        let conn = Uuid::new_v4();
        registry.subscribe(&Topic::Identity(UserId::from("alice")), conn);
        registry.subscribe(&Topic::PathWatchers("alice/a.txt".into()), conn);
        registry.unsubscribe_all(conn);
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_rebase_moves_subtree_topics_only() {
        let registry = TopicRegistry::new();
        let conn = Uuid::new_v4();
        registry.subscribe(&Topic::PathObservers("a/b/".into()), conn);
        registry.subscribe(&Topic::PathWatchers("a/b/f".into()), conn);
        registry.subscribe(&Topic::PathObservers("a/bc/".into()), conn);
        registry.subscribe(&Topic::PathWatchers("x/a/b/".into()), conn);

        assert_eq!(registry.rebase("a/b/", "a/c/"), 2);

        assert!(registry.is_member(&Topic::PathObservers("a/c/".into()), conn));
        assert!(registry.is_member(&Topic::PathWatchers("a/c/f".into()), conn));
        assert!(!registry.is_member(&Topic::PathObservers("a/b/".into()), conn));
        assert!(registry.is_member(&Topic::PathObservers("a/bc/".into()), conn));
        assert!(registry.is_member(&Topic::PathWatchers("x/a/b/".into()), conn));
        assert_eq!(registry.observation_count(conn), 2);
    }

    #[test]
    fn test_rebase_file_is_exact() {
        let registry = TopicRegistry::new();
        let conn = Uuid::new_v4();
        registry.subscribe(&Topic::PathWatchers("a/f".into()), conn);
        registry.subscribe(&Topic::PathWatchers("a/foo".into()), conn);

        assert_eq!(registry.rebase("a/f", "a/g"), 1);
        assert!(registry.is_member(&Topic::PathWatchers("a/g".into()), conn));
        assert!(registry.is_member(&Topic::PathWatchers("a/foo".into()), conn));
    }
}
