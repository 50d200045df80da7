//! Account lifecycle commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use puddle_core::config::AppConfig;
use puddle_core::result::AppResult;
use puddle_core::types::UserId;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create a user's puddle
    Create {
        /// User ID
        user: String,
    },
    /// Delete a user's puddle with every grant and watch they hold
    Delete {
        /// User ID
        user: String,
    },
    /// Issue an access token
    Token {
        /// User ID
        user: String,
    },
}

#[derive(Debug, Serialize)]
struct TokenOutput {
    user_id: UserId,
    access_token: String,
}

pub async fn execute(args: &AccountArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let app = super::services(config).await?;

    match &args.command {
        AccountCommand::Create { user } => {
            let user_id = UserId::parse(user.as_str())?;
            let root = app.accounts.create(&user_id).await?;
            output::print_success(&format!("Created puddle '{}'", root.path));
        }
        AccountCommand::Delete { user } => {
            let user_id = UserId::parse(user.as_str())?;
            let removal = app.accounts.delete(&user_id).await?;
            output::print_item(&removal, format);
            output::print_success(&format!("Deleted account '{user_id}'"));
        }
        AccountCommand::Token { user } => {
            let user_id = UserId::parse(user.as_str())?;
            let access_token = app.issuer.issue(&user_id)?;
            output::print_item(
                &TokenOutput {
                    user_id,
                    access_token,
                },
                format,
            );
        }
    }

    Ok(())
}
