//! Batch upload command against a running server.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::output::{self, OutputFormat};
use nimbus_client::{ClientConfig, TransferOutcome, TransferStatus, UploadManager, UploadSource};
use nimbus_core::error::AppError;
use nimbus_core::types::FolderId;

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Server base URL
    #[arg(short, long, env = "NIMBUS_SERVER", default_value = "http://localhost:5000")]
    pub server: String,

    /// Bearer token from `/api/login`
    #[arg(short, long, env = "NIMBUS_TOKEN")]
    pub token: String,

    /// Target folder ID, the root when omitted
    #[arg(long)]
    pub folder: Option<FolderId>,
}

/// Per-file result row
#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct OutcomeRow {
    /// File name
    name: String,
    /// Result
    status: String,
    /// Server file ID
    file_id: String,
    /// Failure reason
    detail: String,
}

impl From<TransferOutcome> for OutcomeRow {
    fn from(outcome: TransferOutcome) -> Self {
        let (status, file_id, detail) = match outcome.status {
            TransferStatus::Completed(file) => ("completed", file.id.to_string(), String::new()),
            TransferStatus::Failed(message) => ("failed", String::new(), message),
            TransferStatus::Cancelled => ("cancelled", String::new(), String::new()),
        };
        Self {
            name: outcome.display_name,
            status: status.to_string(),
            file_id,
            detail,
        }
    }
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, format: OutputFormat) -> Result<(), AppError> {
    let config = ClientConfig::new(&args.server, &args.token);
    let manager = UploadManager::new(&config)
        .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

    info!(server = %config.base_url, files = args.files.len(), "Starting batch upload");
    let sources = args.files.iter().cloned().map(UploadSource::Path).collect();
    let outcomes = manager.upload_all(sources, args.folder).await;

    let failed = outcomes
        .iter()
        .filter(|o| !matches!(o.status, TransferStatus::Completed(_)))
        .count();
    let rows: Vec<OutcomeRow> = outcomes.into_iter().map(OutcomeRow::from).collect();
    output::print_list(&rows, format);

    if failed > 0 {
        return Err(AppError::validation(format!(
            "{failed} of {} uploads did not complete",
            rows.len()
        )));
    }
    Ok(())
}
