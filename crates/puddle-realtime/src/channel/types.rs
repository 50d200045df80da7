//! Topic names.

use serde::{Deserialize, Serialize};

use puddle_core::types::UserId;

const OBSERVERS_PREFIX: &str = "path-observers:";
const WATCHERS_PREFIX: &str = "path-watchers:";
const IDENTITY_PREFIX: &str = "identity:";

/// Typed topic identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "key", rename_all = "snake_case")]
pub enum Topic {
    /// Connections currently viewing a path.
    PathObservers(String),
    /// Connections of users holding a watch on a path.
    PathWatchers(String),
    /// Every connection of one user.
    Identity(UserId),
}

impl Topic {
    /// Parses a topic string.
    pub fn parse(topic: &str) -> Option<Self> {
        if let Some(path) = topic.strip_prefix(OBSERVERS_PREFIX) {
            Some(Self::PathObservers(path.to_string()))
        } else if let Some(path) = topic.strip_prefix(WATCHERS_PREFIX) {
            Some(Self::PathWatchers(path.to_string()))
        } else {
            topic
                .strip_prefix(IDENTITY_PREFIX)
                .and_then(|uid| UserId::parse(uid).ok())
                .map(Self::Identity)
        }
    }

    /// Converts back to a topic string.
    pub fn to_topic_string(&self) -> String {
        match self {
            Self::PathObservers(path) => format!("{OBSERVERS_PREFIX}{path}"),
            Self::PathWatchers(path) => format!("{WATCHERS_PREFIX}{path}"),
            Self::Identity(user_id) => format!("{IDENTITY_PREFIX}{user_id}"),
        }
    }

    /// Prefixes of the path-keyed families.
    pub(crate) fn path_family_prefixes() -> [&'static str; 2] {
        [OBSERVERS_PREFIX, WATCHERS_PREFIX]
    }
}
