//! Periodic keepalive and stale-connection purge.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

use super::manager::ConnectionManager;

/// Spawns the sweeper loop. Each tick purges stale connections and pings the
/// rest. The loop ends when `shutdown` fires.
pub fn spawn_sweeper(
    connections: Arc<ConnectionManager>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Utc::now();
                    let purged = connections.purge_stale(now);
                    connections.ping_all(now);
                    debug!(
                        purged = purged.len(),
                        active = connections.connection_count(),
                        "Sweep complete"
                    );
                }
                _ = shutdown.recv() => break,
            }
        }
        info!("Connection sweeper stopped");
    })
}
