//! Drop commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use puddle_core::config::AppConfig;
use puddle_core::result::AppResult;
use puddle_entity::drop::Drop;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct DropArgs {
    /// User the command acts as
    #[arg(long = "as", global = true, default_value = "")]
    pub acting_as: String,

    #[command(subcommand)]
    pub command: DropCommand,
}

#[derive(Debug, Subcommand)]
pub enum DropCommand {
    /// List a directory
    Ls { dir: String },
    /// Show a drop's metadata
    Info { path: String },
    /// Create a directory
    Mkdir { parent: String, name: String },
    /// Move a drop into another directory
    Mv {
        path: String,
        new_dir: String,
        /// Rename while moving
        #[arg(long)]
        name: Option<String>,
    },
    /// Copy a drop
    Cp { path: String, destination: String },
    /// Delete a drop and everything below it
    Rm { path: String },
    /// Remove grants and watches left behind by an interrupted cascade
    Repair { root: String },
}

#[derive(Debug, Serialize, Tabled)]
struct DropRow {
    path: String,
    owner: String,
    created_by: String,
    last_edited: String,
}

impl From<&Drop> for DropRow {
    fn from(drop: &Drop) -> Self {
        Self {
            path: drop.path.clone(),
            owner: drop.owner_id.to_string(),
            created_by: drop.created_by.to_string(),
            last_edited: drop.last_edited_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub async fn execute(args: &DropArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let app = super::services(config).await?;

    if let DropCommand::Repair { root } = &args.command {
        let report = app.namespace.repair(root).await?;
        output::print_item(&report, format);
        return Ok(());
    }

    let ctx = super::acting_as(&args.acting_as)?;
    match &args.command {
        DropCommand::Ls { dir } => {
            let children = app.drops.contents(&ctx, dir).await?;
            let rows: Vec<DropRow> = children.iter().map(DropRow::from).collect();
            output::print_list(&rows, format);
        }
        DropCommand::Info { path } => {
            let info = app.drops.info(&ctx, path).await?;
            output::print_item(&info, format);
        }
        DropCommand::Mkdir { parent, name } => {
            let created = app.drops.create_directory(&ctx, parent, name).await?;
            output::print_success(&format!("Created '{}'", created.path));
        }
        DropCommand::Mv {
            path,
            new_dir,
            name,
        } => {
            let target = app
                .drops
                .move_drop(&ctx, path, new_dir, name.as_deref())
                .await?;
            output::print_success(&format!("Moved '{path}' to '{target}'"));
        }
        DropCommand::Cp { path, destination } => {
            let created = app.drops.copy_drop(&ctx, path, destination).await?;
            output::print_success(&format!(
                "Copied '{path}' to '{destination}' ({created} entries)"
            ));
        }
        DropCommand::Rm { path } => {
            let removed = app.drops.delete_drop(&ctx, path).await?;
            output::print_success(&format!("Deleted '{path}' ({removed} entries)"));
        }
        DropCommand::Repair { .. } => {}
    }

    Ok(())
}
