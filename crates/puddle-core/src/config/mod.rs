//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod auth;
pub mod database;
pub mod logging;
pub mod realtime;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::database::{DatabaseConfig, StoreBackend};
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::storage::{StorageConfig, StorageProviderKind};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time event bus settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, the `config/{env}` overlay and environment
    /// variables prefixed with `PUDDLE__` (for example
    /// `PUDDLE__DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration starting from an explicit base file.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PUDDLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
