//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use nimbus_api::AppState;
use nimbus_core::error::AppError;
use nimbus_database::migration::run_migrations;
use nimbus_service::user::RegisterRequest;

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create an account and print its reset key
    Create {
        /// Login name
        username: String,
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Password
        #[arg(short, long, env = "NIMBUS_NEW_PASSWORD")]
        password: String,
        /// Display name, defaults to the username
        #[arg(short, long)]
        display_name: Option<String>,
    },
}

/// Created account row
#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct CreatedUserRow {
    /// User ID
    id: String,
    /// Username
    username: String,
    /// Email
    email: String,
    /// Reset key
    reset_key: String,
}

/// Execute user commands
pub async fn execute(args: &UserArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let db = super::connect(&config).await?;
    run_migrations(db.pool()).await?;
    let state = AppState::build(config, db.pool().clone()).await?;

    match &args.command {
        UserCommand::Create {
            username,
            email,
            password,
            display_name,
        } => {
            let session = state
                .account_service
                .register(RegisterRequest {
                    username: username.clone(),
                    email: email.clone(),
                    password: password.clone(),
                    display_name: display_name.clone(),
                })
                .await?;

            let user = session.user;
            if format == OutputFormat::Table {
                output::print_success(&format!("User '{}' created", user.username));
                output::print_kv("ID", &user.id.to_string());
                output::print_kv("Reset key", &user.current_reset_key);
                output::print_warning(
                    "Store the reset key safely. It is the only way to reset the password.",
                );
            } else {
                let row = CreatedUserRow {
                    id: user.id.to_string(),
                    username: user.username,
                    email: user.email,
                    reset_key: user.current_reset_key,
                };
                output::print_list(&[row], format);
            }
        }
    }

    db.close().await;
    Ok(())
}
