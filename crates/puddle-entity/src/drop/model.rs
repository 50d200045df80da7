//! Drop entity model.

use chrono::{DateTime, Utc};
use puddle_core::types::{UserId, path};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A file or directory in the namespace, keyed by its full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Drop {
    /// Full path; a trailing separator marks a directory.
    pub path: String,
    /// Who created the drop.
    pub created_by: UserId,
    /// When the drop was created.
    pub created_at: DateTime<Utc>,
    /// Who last renamed or moved the drop.
    pub last_edited_by: UserId,
    /// When the drop was last renamed or moved.
    pub last_edited_at: DateTime<Utc>,
    /// Owner of the puddle the drop lives in.
    pub owner_id: UserId,
}

impl Drop {
    /// Build a fresh record stamped with the current time.
    pub fn from_new(new: NewDrop) -> Self {
        let now = Utc::now();
        Self {
            path: new.path,
            last_edited_by: new.created_by.clone(),
            created_by: new.created_by,
            created_at: now,
            last_edited_at: now,
            owner_id: new.owner_id,
        }
    }

    /// Whether this drop is a directory.
    pub fn is_directory(&self) -> bool {
        path::is_directory(&self.path)
    }

    /// Last path segment (with the trailing separator for directories).
    pub fn name(&self) -> &str {
        path::leaf_name(&self.path)
    }

    /// Directory containing this drop.
    pub fn parent_dir(&self) -> &str {
        path::parent_dir(&self.path)
    }

    /// Whether this is a user's puddle root.
    pub fn is_puddle_root(&self) -> bool {
        path::is_protected_root(&self.path)
    }
}

/// Data required to create a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrop {
    /// Full path.
    pub path: String,
    /// Creator.
    pub created_by: UserId,
    /// Owner.
    pub owner_id: UserId,
}

impl NewDrop {
    /// Create a new drop description.
    pub fn new(path: impl Into<String>, created_by: UserId, owner_id: UserId) -> Self {
        Self {
            path: path.into(),
            created_by,
            owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_stamps_editor() {
        let drop = Drop::from_new(NewDrop::new(
            "alice/docs/",
            UserId::from("bob"),
            UserId::from("alice"),
        ));
        assert_eq!(drop.last_edited_by, UserId::from("bob"));
        assert_eq!(drop.created_at, drop.last_edited_at);
        assert!(drop.is_directory());
        assert_eq!(drop.name(), "docs/");
        assert_eq!(drop.parent_dir(), "alice/");
        assert!(!drop.is_puddle_root());
    }

    #[test]
    fn test_serializes_user_ids_as_strings() {
        let drop = Drop::from_new(NewDrop::new(
            "alice/",
            UserId::from("alice"),
            UserId::from("alice"),
        ));
        let json = serde_json::to_value(&drop).expect("serialize");
        assert_eq!(json["owner_id"], "alice");
        assert!(drop.is_puddle_root());
    }
}
