//! The caller an operation runs on behalf of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use puddle_core::traits::Identity;
use puddle_core::types::UserId;

/// Context for one authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }

    /// Whether `path` lies in the caller's own puddle.
    pub fn owns_path(&self, path: &str) -> bool {
        puddle_core::types::path::owner(path) == self.user_id.as_str()
    }
}

impl From<Identity> for RequestContext {
    fn from(identity: Identity) -> Self {
        Self::new(identity.user_id)
    }
}
