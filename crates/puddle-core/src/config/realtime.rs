//! Real-time event bus configuration.

use serde::{Deserialize, Serialize};

/// Real-time connection and topic settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound buffer. Deliveries beyond it are dropped.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum live connections per user; the oldest is evicted.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Maximum observed paths per connection.
    #[serde(default = "default_max_observations")]
    pub max_observations_per_connection: usize,
    /// A connection without a pong for this long is purged.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
    /// How often the sweeper looks for stale connections.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
            max_observations_per_connection: default_max_observations(),
            stale_after_seconds: default_stale_after(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_max_observations() -> usize {
    50
}

fn default_stale_after() -> u64 {
    90
}

fn default_sweep_interval() -> u64 {
    30
}
