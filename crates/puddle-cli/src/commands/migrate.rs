//! Database migrations.

use clap::{Args, Subcommand};

use puddle_core::config::{AppConfig, StoreBackend};
use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_database::DatabasePool;
use puddle_database::migration::run_migrations;

use crate::output;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Check that the database answers
    Ping,
}

pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> AppResult<()> {
    if config.database.backend != StoreBackend::Postgres {
        return Err(AppError::configuration(
            "Migrations need the postgres backend",
        ));
    }
    let pool = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Ping => {
            pool.ping().await?;
            output::print_success("Database reachable.");
        }
    }

    pool.close().await;
    Ok(())
}
