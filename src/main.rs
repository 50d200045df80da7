//! Puddle Server: hierarchical drop and ACL metadata engine
//!
//! Main entry point that wires the stores, blob storage and real-time
//! engine together and keeps the process alive until a shutdown signal.

use tracing_subscriber::{EnvFilter, fmt};

use puddle_core::config::AppConfig;
use puddle_core::error::AppError;
use puddle_service::AppServices;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and env vars
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("PUDDLE_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("PUDDLE_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_from(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Puddle v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = ?config.database.backend,
        storage = ?config.storage.provider,
        "Building services"
    );

    // ── Step 1: Stores, blobs, auth and the real-time engine ────
    let app = AppServices::build(&config).await?;

    // ── Step 2: Stale connection sweeper ─────────────────────────
    let sweeper = app.realtime.spawn_sweeper();
    tracing::info!(
        sweep_interval_seconds = config.realtime.sweep_interval_seconds,
        "Real-time sweeper started"
    );

    // ── Step 3: Wait for shutdown ────────────────────────────────
    shutdown_signal().await?;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    app.realtime.shutdown();
    if let Err(e) = sweeper.await {
        tracing::warn!("Sweeper task ended abnormally: {}", e);
    }

    let metrics = app.realtime.metrics_snapshot();
    tracing::info!(
        messages_sent = metrics.messages_sent,
        messages_dropped = metrics.messages_dropped,
        connections_total = metrics.connections_total,
        "Puddle stopped"
    );

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() -> Result<(), AppError> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
