//! Database migration command.

use crate::output;
use nimbus_core::error::AppError;
use nimbus_database::migration::run_migrations;

/// Apply all pending migrations
pub async fn execute(env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let db = super::connect(&config).await?;

    println!("Running database migrations...");
    run_migrations(db.pool()).await?;
    output::print_success("All migrations applied successfully.");

    db.close().await;
    Ok(())
}
