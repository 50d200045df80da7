//! A single topic and its members.

use std::collections::HashSet;

use crate::connection::handle::ConnectionId;

/// One topic with the set of connections joined to it.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Topic string.
    pub name: String,
    /// Joined connections.
    pub members: HashSet<ConnectionId>,
}

impl Channel {
    /// Creates an empty topic.
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    /// Adds a member. Returns `false` if it was already joined.
    pub fn join(&mut self, conn_id: ConnectionId) -> bool {
        self.members.insert(conn_id)
    }

    /// Removes a member.
    pub fn leave(&mut self, conn_id: ConnectionId) -> bool {
        self.members.remove(&conn_id)
    }

    /// Returns whether the topic has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
