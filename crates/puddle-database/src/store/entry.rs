//! Drop entry store.

use async_trait::async_trait;

use puddle_core::result::AppResult;
use puddle_core::types::{UserId, path};
use puddle_entity::drop::{Drop, NewDrop};

/// Persistent mapping from path to [`Drop`].
///
/// Subtree queries are prefix scans: a directory's subtree is the directory
/// itself plus every path that starts with it. Files have no subtree.
#[async_trait]
pub trait EntryStore: Send + Sync + std::fmt::Debug + 'static {
    /// Look up the drop at `path`.
    async fn get(&self, path: &str) -> AppResult<Option<Drop>>;

    /// Insert a drop unless one already exists at its path.
    ///
    /// Returns `false` and leaves the existing record untouched on collision.
    async fn create(&self, drop: NewDrop) -> AppResult<bool>;

    /// Insert many drops with the same idempotent semantics as
    /// [`EntryStore::create`]. Returns how many were inserted.
    async fn create_many(&self, drops: Vec<NewDrop>) -> AppResult<u64>;

    /// Every drop equal to or below directory `path`, ordered by path.
    /// Empty for file paths.
    async fn list_subtree(&self, path: &str) -> AppResult<Vec<Drop>>;

    /// Move `old_path` (and, for directories, everything below it) to
    /// `new_path`. Every moved record gets `editor` as last editor and
    /// `new_owner` as owner. Returns the number of records moved.
    async fn rename(
        &self,
        old_path: &str,
        new_path: &str,
        editor: &UserId,
        new_owner: &UserId,
    ) -> AppResult<u64>;

    /// Delete `path` (and its subtree for directories). Returns the number of
    /// records removed; zero means nothing matched.
    async fn delete(&self, path: &str) -> AppResult<u64>;

    /// Direct children of `dir`, excluding deeper descendants and `dir`
    /// itself.
    async fn list_immediate_children(&self, dir: &str) -> AppResult<Vec<Drop>> {
        let mut subtree = self.list_subtree(dir).await?;
        subtree.retain(|drop| path::parent_dir(&drop.path) == dir);
        Ok(subtree)
    }

    /// Whether a drop exists at `path`.
    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.get(path).await?.is_some())
    }
}
