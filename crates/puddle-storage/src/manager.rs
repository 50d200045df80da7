//! Provider selection.

use std::sync::Arc;

use tracing::info;

use puddle_core::config::{StorageConfig, StorageProviderKind};
use puddle_core::result::AppResult;
use puddle_core::traits::BlobStore;

use crate::providers::{LocalBlobStore, MemoryBlobStore};

/// Build the blob store selected by `config`.
pub async fn build_blob_store(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.provider {
        StorageProviderKind::Local => Arc::new(LocalBlobStore::new(&config.root).await?),
        StorageProviderKind::Memory => Arc::new(MemoryBlobStore::new()),
    };
    info!(provider = store.provider_type(), "Blob store ready");
    Ok(store)
}
