//! # nimbus-client
//!
//! Client-side upload progress management for Nimbus Drive.
//!
//! - [`UploadTracker`] owns per-transfer progress records and the live
//!   cancellation handles behind them.
//! - [`UploadClient`] streams one file to `POST /api/files` and reports
//!   bytes sent.
//! - [`UploadManager`] runs a batch: it registers every file, starts the
//!   transfers with a small stagger, and isolates failures per file.

pub mod config;
pub mod error;
pub mod manager;
pub mod progress;
pub mod source;
pub mod tracker;
pub mod transport;

pub use config::ClientConfig;
pub use error::TransferError;
pub use manager::{TransferOutcome, TransferStatus, UploadManager};
pub use source::UploadSource;
pub use tracker::{ProgressSnapshot, TransferEvent, TransferId, TransferProgress, UploadTracker};
pub use transport::{RemoteFile, UploadClient};
