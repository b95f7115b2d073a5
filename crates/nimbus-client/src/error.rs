//! Per-transfer failures.

use thiserror::Error;

/// Why a single transfer did not produce a file.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The server answered with an error body.
    #[error("server rejected upload ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// The `message` field of the error body.
        message: String,
    },
    /// The request could not be completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The source could not be read.
    #[error("could not read source: {0}")]
    Source(#[from] std::io::Error),
    /// The transfer was cancelled by the user.
    #[error("upload cancelled")]
    Cancelled,
}

impl TransferError {
    /// Whether the user asked for this.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
