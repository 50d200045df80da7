//! Watch model.

use chrono::{DateTime, Utc};
use puddle_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A standing request by a user to be notified about changes to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Watch {
    /// Watching user.
    pub user_id: UserId,
    /// Watched path.
    pub path: String,
    /// When the watch was added.
    pub created_at: DateTime<Utc>,
}

impl Watch {
    /// Create a watch stamped with the current time.
    pub fn new(user_id: UserId, path: impl Into<String>) -> Self {
        Self {
            user_id,
            path: path.into(),
            created_at: Utc::now(),
        }
    }
}
