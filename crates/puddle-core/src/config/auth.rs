//! Token authentication configuration.

use serde::{Deserialize, Serialize};

/// Settings for issuing and resolving access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify access tokens.
    #[serde(default = "default_secret")]
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Allowed clock skew when checking expiry, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_secret(),
            access_ttl_minutes: default_access_ttl(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_secret() -> String {
    "change-me".to_string()
}

fn default_access_ttl() -> u64 {
    60
}

fn default_leeway() -> u64 {
    5
}
