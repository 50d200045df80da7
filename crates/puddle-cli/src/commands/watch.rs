//! Watch commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use puddle_core::config::AppConfig;
use puddle_core::result::AppResult;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// User the command acts as
    #[arg(long = "as", global = true, default_value = "")]
    pub acting_as: String,

    #[command(subcommand)]
    pub command: WatchCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchCommand {
    /// List the acting user's watches
    List,
    /// Watch a path
    Add { path: String },
    /// Stop watching a path
    Remove { path: String },
}

#[derive(Debug, Serialize, Tabled)]
struct WatchRow {
    path: String,
    since: String,
}

pub async fn execute(args: &WatchArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let app = super::services(config).await?;
    let ctx = super::acting_as(&args.acting_as)?;

    match &args.command {
        WatchCommand::List => {
            let rows: Vec<WatchRow> = app
                .watches
                .list(&ctx)
                .await?
                .into_iter()
                .map(|w| WatchRow {
                    path: w.path,
                    since: w.created_at.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        WatchCommand::Add { path } => {
            if app.watches.watch(&ctx, path).await? {
                output::print_success(&format!("Watching '{path}'"));
            } else {
                output::print_success(&format!("Already watching '{path}'"));
            }
        }
        WatchCommand::Remove { path } => {
            if app.watches.unwatch(&ctx, path).await? {
                output::print_success(&format!("Stopped watching '{path}'"));
            } else {
                output::print_success(&format!("Was not watching '{path}'"));
            }
        }
    }

    Ok(())
}
