//! Physical byte storage keyed by drop path.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for blob storage backends.
///
/// Paths are drop paths; a trailing separator denotes a directory. Calls are
/// made after the metadata change they mirror has committed.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a whole file, creating missing parent directories.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Size in bytes of a file, or of every file below a directory.
    async fn size(&self, path: &str) -> AppResult<u64>;

    /// Create a directory (and any missing parents).
    async fn create_directory(&self, path: &str) -> AppResult<()>;

    /// Copy a file or a whole directory tree.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Move a file or a whole directory tree.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    /// Delete a file or a whole directory tree. Missing paths are not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Check whether anything exists at `path`.
    async fn exists(&self, path: &str) -> AppResult<bool>;
}
