//! Result alias shared by every Nimbus crate.

use crate::error::AppError;

/// `Result` specialized to [`AppError`].
pub type AppResult<T> = Result<T, AppError>;
