//! Grant commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use puddle_core::config::AppConfig;
use puddle_core::result::AppResult;
use puddle_core::types::{GrantKind, UserId};
use puddle_entity::permission::PermissionGrant;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ShareArgs {
    /// User the command acts as
    #[arg(long = "as", global = true, default_value = "")]
    pub acting_as: String,

    #[command(subcommand)]
    pub command: ShareCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// List grants on a path
    List {
        path: String,
        /// Only this grantee
        #[arg(long)]
        user: Option<String>,
        /// read, write, modify or all
        #[arg(long, default_value = "all")]
        kind: GrantKind,
    },
    /// Grant a permission on a path and everything below it
    Grant {
        path: String,
        user: String,
        kind: GrantKind,
    },
    /// Revoke a permission on a path and everything below it
    Revoke {
        path: String,
        user: String,
        kind: GrantKind,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct GrantRow {
    path: String,
    user: String,
    kind: String,
}

impl From<&PermissionGrant> for GrantRow {
    fn from(grant: &PermissionGrant) -> Self {
        Self {
            path: grant.path.clone(),
            user: grant.user_id.to_string(),
            kind: grant.kind.to_string(),
        }
    }
}

fn print_grants(grants: &[PermissionGrant], format: OutputFormat) {
    let rows: Vec<GrantRow> = grants.iter().map(GrantRow::from).collect();
    output::print_list(&rows, format);
}

pub async fn execute(args: &ShareArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let app = super::services(config).await?;
    let ctx = super::acting_as(&args.acting_as)?;

    match &args.command {
        ShareCommand::List { path, user, kind } => {
            let user_id = user.as_deref().map(UserId::parse).transpose()?;
            let grants = app.sharing.list(&ctx, path, user_id, *kind).await?;
            print_grants(&grants, format);
        }
        ShareCommand::Grant { path, user, kind } => {
            let user_id = UserId::parse(user.as_str())?;
            let created = app.sharing.grant(&ctx, path, &user_id, *kind).await?;
            print_grants(&created, format);
        }
        ShareCommand::Revoke { path, user, kind } => {
            let user_id = UserId::parse(user.as_str())?;
            let revoked = app.sharing.revoke(&ctx, path, &user_id, *kind).await?;
            print_grants(&revoked, format);
        }
    }

    Ok(())
}
