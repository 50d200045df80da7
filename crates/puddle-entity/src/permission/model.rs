//! Permission grant model.

use puddle_core::types::{PermissionKind, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One `(path, user, kind)` access-control record.
///
/// There is no inheritance: a directory's grants are copied onto every drop
/// beneath it when the drop is created or the grant is issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromRow)]
pub struct PermissionGrant {
    /// Drop path the grant is attached to.
    pub path: String,
    /// Grantee.
    pub user_id: UserId,
    /// Permission kind.
    pub kind: PermissionKind,
}

impl PermissionGrant {
    /// Create a grant value.
    pub fn new(path: impl Into<String>, user_id: UserId, kind: PermissionKind) -> Self {
        Self {
            path: path.into(),
            user_id,
            kind,
        }
    }
}
