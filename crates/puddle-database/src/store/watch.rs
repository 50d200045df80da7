//! Watch store.

use async_trait::async_trait;

use puddle_core::result::AppResult;
use puddle_core::types::UserId;
use puddle_entity::watch::Watch;

/// Persistent mapping from `(user, path)` to a watch record.
#[async_trait]
pub trait WatchStore: Send + Sync + std::fmt::Debug + 'static {
    /// Add a watch. Returns `false` if it already existed.
    async fn add(&self, user_id: &UserId, path: &str) -> AppResult<bool>;

    /// Remove a watch. Returns `false` if there was none.
    async fn remove(&self, user_id: &UserId, path: &str) -> AppResult<bool>;

    /// Remove every watch on `path` (and below it for directories).
    async fn remove_all_for_path(&self, path: &str) -> AppResult<Vec<Watch>>;

    /// Remove every watch held by `user_id`.
    async fn remove_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<Watch>>;

    /// Watches held by `user_id`, ordered by path.
    async fn list(&self, user_id: &UserId) -> AppResult<Vec<Watch>>;

    /// Watches on exactly `path`.
    async fn list_watchers(&self, path: &str) -> AppResult<Vec<Watch>>;

    /// Watches on directory `path` or below it (exact path for files).
    async fn list_subtree(&self, path: &str) -> AppResult<Vec<Watch>>;

    /// Rewrite the leading `old_path` prefix of every watch in its scope.
    async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64>;
}
