//! In-memory blob store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::traits::BlobStore;
use puddle_core::types::path;

/// Keeps blobs in a path-ordered map. Directories are keys with a trailing
/// separator and no content.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn scope(blobs: &BTreeMap<String, Bytes>, target: &str) -> Vec<String> {
    if path::is_directory(target) {
        blobs
            .range(target.to_string()..)
            .take_while(|(key, _)| key.starts_with(target))
            .map(|(key, _)| key.clone())
            .collect()
    } else if blobs.contains_key(target) {
        vec![target.to_string()]
    } else {
        Vec::new()
    }
}

fn missing(target: &str) -> AppError {
    AppError::not_found(format!("No blob at '{target}'"))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn write(&self, target: &str, data: Bytes) -> AppResult<()> {
        self.blobs.write().await.insert(target.to_string(), data);
        Ok(())
    }

    async fn size(&self, target: &str) -> AppResult<u64> {
        let blobs = self.blobs.read().await;
        Ok(scope(&blobs, target)
            .iter()
            .filter_map(|key| blobs.get(key))
            .map(|data| data.len() as u64)
            .sum())
    }

    async fn create_directory(&self, target: &str) -> AppResult<()> {
        self.blobs
            .write()
            .await
            .entry(target.to_string())
            .or_insert_with(Bytes::new);
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let mut blobs = self.blobs.write().await;
        let keys = scope(&blobs, from);
        if keys.is_empty() {
            return Err(missing(from));
        }
        let copies: Vec<_> = keys
            .iter()
            .filter_map(|key| Some((path::rebase(key, from, to)?, blobs.get(key)?.clone())))
            .collect();
        blobs.extend(copies);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let mut blobs = self.blobs.write().await;
        let keys = scope(&blobs, from);
        if keys.is_empty() {
            return Err(missing(from));
        }
        let mut moved = Vec::with_capacity(keys.len());
        for key in keys {
            if let (Some(data), Some(rebased)) = (blobs.remove(&key), path::rebase(&key, from, to)) {
                moved.push((rebased, data));
            }
        }
        blobs.extend(moved);
        Ok(())
    }

    async fn delete(&self, target: &str) -> AppResult<()> {
        let mut blobs = self.blobs.write().await;
        for key in scope(&blobs, target) {
            blobs.remove(&key);
        }
        Ok(())
    }

    async fn exists(&self, target: &str) -> AppResult<bool> {
        let blobs = self.blobs.read().await;
        Ok(!scope(&blobs, target).is_empty())
    }
}
