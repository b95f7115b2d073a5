//! CLI command definitions and dispatch.

pub mod migrate;
pub mod upload;
pub mod user;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use nimbus_core::config::AppConfig;
use nimbus_core::error::AppError;
use nimbus_database::DatabasePool;

/// Nimbus Drive: personal cloud file storage
#[derive(Debug, Parser)]
#[command(name = "nimbus", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (selects `config/{env}.toml`)
    #[arg(short, long, env = "NIMBUS_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// User management
    User(user::UserArgs),
    /// Upload files to a running server
    Upload(upload::UploadArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(&self.env).await,
            Commands::User(args) => user::execute(args, &self.env, self.format).await,
            Commands::Upload(args) => upload::execute(args, self.format).await,
        }
    }
}

/// Helper: load configuration for an environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: connect to the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}
