//! Filters for listing and revoking grant rows.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::path;
use super::permission::PermissionKind;

/// Selects grant rows on a path. Omitted fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantFilter {
    /// Path the grants are attached to.
    pub path: String,
    /// Restrict to one user.
    pub user_id: Option<UserId>,
    /// Restrict to one kind.
    pub kind: Option<PermissionKind>,
}

impl GrantFilter {
    /// Match every grant on `path`.
    pub fn on(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user_id: None,
            kind: None,
        }
    }

    /// Restrict to a single user.
    pub fn user(mut self, user_id: impl Into<Option<UserId>>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Restrict to a single kind.
    pub fn kind(mut self, kind: impl Into<Option<PermissionKind>>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Whether a row matches the user and kind parts of the filter.
    pub fn matches_grantee(&self, user_id: &UserId, kind: PermissionKind) -> bool {
        self.user_id.as_ref().is_none_or(|u| u == user_id)
            && self.kind.is_none_or(|k| k == kind)
    }

    /// Whether a row matches when the path is treated as a scope: a directory
    /// path covers its whole subtree, a file path only itself.
    pub fn matches_scoped(&self, row_path: &str, user_id: &UserId, kind: PermissionKind) -> bool {
        path::is_within(row_path, &self.path) && self.matches_grantee(user_id, kind)
    }

    /// Whether a row matches the exact path.
    pub fn matches_exact(&self, row_path: &str, user_id: &UserId, kind: PermissionKind) -> bool {
        row_path == self.path && self.matches_grantee(user_id, kind)
    }
}
