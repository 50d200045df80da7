//! CLI command definitions and dispatch.

pub mod account;
pub mod drop;
pub mod migrate;
pub mod share;
pub mod watch;

use clap::{Parser, Subcommand};

use puddle_core::config::AppConfig;
use puddle_core::result::AppResult;
use puddle_core::types::UserId;
use puddle_service::{AppServices, RequestContext};

use crate::output::OutputFormat;

/// Puddle: hierarchical drops with per-path access control
#[derive(Debug, Parser)]
#[command(name = "puddle", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file (without extension)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from config/{env}
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate(migrate::MigrateArgs),
    /// Create, delete and authenticate accounts
    Account(account::AccountArgs),
    /// Browse and restructure drops
    Drop(drop::DropArgs),
    /// Inspect and change grants
    Share(share::ShareArgs),
    /// Manage watches
    Watch(watch::WatchArgs),
}

impl Cli {
    pub async fn execute(&self) -> AppResult<()> {
        let config = AppConfig::load_from(&self.config, &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Account(args) => account::execute(args, &config, self.format).await,
            Commands::Drop(args) => drop::execute(args, &config, self.format).await,
            Commands::Share(args) => share::execute(args, &config, self.format).await,
            Commands::Watch(args) => watch::execute(args, &config, self.format).await,
        }
    }
}

/// Wire the services for one command.
pub async fn services(config: &AppConfig) -> AppResult<AppServices> {
    tracing::debug!(
        backend = ?config.database.backend,
        storage = ?config.storage.provider,
        "Building services"
    );
    AppServices::build(config).await
}

/// Request context for the user a command acts as.
pub fn acting_as(user: &str) -> AppResult<RequestContext> {
    Ok(RequestContext::new(UserId::parse(user)?))
}
