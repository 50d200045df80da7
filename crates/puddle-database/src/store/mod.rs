//! Store traits and the bundle handed to the service layer.

pub mod entry;
pub mod permission;
pub mod watch;

use std::sync::Arc;

use tracing::info;

use puddle_core::config::{DatabaseConfig, StoreBackend};
use puddle_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::{MemoryEntryStore, MemoryPermissionStore, MemoryWatchStore};
use crate::migration::run_migrations;
use crate::repositories::{DropRepository, PermissionRepository, WatchRepository};

pub use entry::EntryStore;
pub use permission::PermissionStore;
pub use watch::WatchStore;

/// The three namespace stores, sharing one backend.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Drop entries.
    pub entries: Arc<dyn EntryStore>,
    /// Permission grants.
    pub permissions: Arc<dyn PermissionStore>,
    /// Watches.
    pub watches: Arc<dyn WatchStore>,
}

impl Stores {
    /// PostgreSQL-backed stores on an existing pool.
    pub fn postgres(pool: &DatabasePool) -> Self {
        let pool = pool.pool().clone();
        Self {
            entries: Arc::new(DropRepository::new(pool.clone())),
            permissions: Arc::new(PermissionRepository::new(pool.clone())),
            watches: Arc::new(WatchRepository::new(pool)),
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn memory() -> Self {
        let entries: Arc<dyn EntryStore> = Arc::new(MemoryEntryStore::new());
        Self {
            permissions: Arc::new(MemoryPermissionStore::new(Arc::clone(&entries))),
            watches: Arc::new(MemoryWatchStore::new()),
            entries,
        }
    }

    /// Build the stores selected by `config`, connecting and migrating when
    /// the backend is PostgreSQL.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory stores");
                Ok(Self::memory())
            }
            StoreBackend::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                run_migrations(pool.pool()).await?;
                Ok(Self::postgres(&pool))
            }
        }
    }
}
