//! # nimbus-database
//!
//! SQLite connection management, embedded migrations, and concrete
//! repository implementations for all Nimbus entities. Every repository
//! method that touches user content takes the owner id and filters on it,
//! so a row owned by someone else reads exactly like a missing row.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{AchievementRepository, FileRepository, FolderRepository, UserRepository};

use nimbus_core::error::{AppError, ErrorKind};

/// Map a sqlx error to a database [`AppError`], turning unique-constraint
/// violations into conflicts with the given message.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    conflict_message: impl FnOnce(&str) -> Option<String>,
    context: &str,
) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            if let Some(message) = conflict_message(db_err.message()) {
                return AppError::conflict(message);
            }
        }
    }
    AppError::with_source(ErrorKind::Database, context.to_string(), err)
}
