//! Permission grant store.

use async_trait::async_trait;

use puddle_core::result::AppResult;
use puddle_core::types::{GrantFilter, GrantKind, PermissionKind, UserId};
use puddle_entity::permission::PermissionGrant;

/// Persistent mapping from `(path, user, kind)` to a grant row.
#[async_trait]
pub trait PermissionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Point lookup used as the authorization primitive.
    async fn check(
        &self,
        path: &str,
        user_id: &UserId,
        kind: PermissionKind,
    ) -> AppResult<Option<PermissionGrant>>;

    /// Grants on exactly `filter.path`, narrowed by the optional user and
    /// kind.
    async fn list(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>>;

    /// Every grant on directory `path` or below it (exact path for files).
    async fn list_subtree(&self, path: &str) -> AppResult<Vec<PermissionGrant>>;

    /// Materialise `kind` for `user_id` on `path` and on every drop currently
    /// below it. Existing rows are kept. Returns only the rows inserted.
    async fn grant(
        &self,
        path: &str,
        user_id: &UserId,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>>;

    /// Delete grants matching `filter`. A directory path covers its whole
    /// subtree. Returns the rows deleted.
    async fn revoke(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>>;

    /// Delete every grant held by `user_id`.
    async fn revoke_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<PermissionGrant>>;

    /// Rewrite the leading `old_path` prefix of every grant in its scope to
    /// `new_path`. Stale grants already sitting at the destination are
    /// replaced. Returns the number of rows moved.
    async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64>;
}
