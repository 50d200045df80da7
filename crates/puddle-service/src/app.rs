//! Wiring of stores, blob storage, auth, the event bus and the services.

use std::sync::Arc;

use tracing::info;

use puddle_auth::{AccessChecker, JwtAuthenticator, JwtIssuer};
use puddle_core::config::{AppConfig, AuthConfig, RealtimeConfig};
use puddle_core::result::AppResult;
use puddle_core::traits::{Authenticator, BlobStore};
use puddle_database::Stores;
use puddle_realtime::RealtimeEngine;
use puddle_storage::build_blob_store;

use crate::account::AccountService;
use crate::drops::DropService;
use crate::namespace::NamespaceCoordinator;
use crate::sharing::SharingService;
use crate::watches::WatchService;

/// Every service of a running instance.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub stores: Stores,
    pub realtime: RealtimeEngine,
    pub authenticator: Arc<dyn Authenticator>,
    pub issuer: Arc<JwtIssuer>,
    pub namespace: Arc<NamespaceCoordinator>,
    pub drops: DropService,
    pub sharing: SharingService,
    pub watches: WatchService,
    pub accounts: AccountService,
}

impl AppServices {
    /// Connects the configured backends and wires everything.
    pub async fn build(config: &AppConfig) -> AppResult<Self> {
        let stores = Stores::from_config(&config.database).await?;
        let blobs = build_blob_store(&config.storage).await?;
        let services = Self::from_parts(stores, blobs, &config.auth, config.realtime.clone());
        info!("Services initialized");
        Ok(services)
    }

    /// Wires the services over already-built stores and blob storage.
    pub fn from_parts(
        stores: Stores,
        blobs: Arc<dyn BlobStore>,
        auth: &AuthConfig,
        realtime: RealtimeConfig,
    ) -> Self {
        let access = AccessChecker::new(stores.permissions.clone());
        let authenticator: Arc<dyn Authenticator> = Arc::new(JwtAuthenticator::new(auth));
        let issuer = Arc::new(JwtIssuer::new(auth));

        let realtime = RealtimeEngine::new(
            realtime,
            authenticator.clone(),
            stores.watches.clone(),
            access.clone(),
        );
        let namespace = Arc::new(NamespaceCoordinator::new(
            stores.clone(),
            blobs,
            realtime.publisher(),
        ));

        Self {
            drops: DropService::new(namespace.clone(), access.clone()),
            sharing: SharingService::new(namespace.clone(), access.clone()),
            watches: WatchService::new(namespace.clone(), access),
            accounts: AccountService::new(namespace.clone()),
            stores,
            realtime,
            authenticator,
            issuer,
            namespace,
        }
    }
}
