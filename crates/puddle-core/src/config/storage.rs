//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Blob storage provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderKind {
    /// Files under a local root directory.
    Local,
    /// Bytes kept in process memory.
    Memory,
}

/// Blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Provider type.
    #[serde(default = "default_provider")]
    pub provider: StorageProviderKind,
    /// Root directory for the local provider.
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            root: default_root(),
        }
    }
}

fn default_provider() -> StorageProviderKind {
    StorageProviderKind::Local
}

fn default_root() -> String {
    "./data/puddles".to_string()
}
