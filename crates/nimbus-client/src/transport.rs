//! HTTP transport for a single upload.

use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use nimbus_core::types::{FileId, FolderId};

use crate::config::ClientConfig;
use crate::error::TransferError;
use crate::progress::{ProgressFn, ProgressStream};
use crate::source::UploadSource;

/// The part of the server's File record a client cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Server id.
    pub id: FileId,
    /// Name as uploaded.
    pub original_name: String,
    /// MIME type recorded by the server.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Containing folder, `None` at the root.
    pub folder_id: Option<FolderId>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Sends files to `POST /api/files`.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl UploadClient {
    /// Builds a client with the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, TransferError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/files", config.base_url),
            token: config.token.clone(),
        })
    }

    /// Uploads one source into `folder_id`, or the root.
    ///
    /// `on_progress` receives whole percentages as the body is sent.
    /// Cancelling `cancel` drops the in-flight request.
    pub async fn upload(
        &self,
        source: UploadSource,
        folder_id: Option<FolderId>,
        on_progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<RemoteFile, TransferError> {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let opened = source.open().await?;
        let mime = mime_guess::from_path(&opened.name).first_or_octet_stream();
        let body = Body::wrap_stream(ProgressStream::new(opened.stream, opened.len, on_progress));
        let part = Part::stream_with_length(body, opened.len)
            .file_name(opened.name.clone())
            .mime_str(mime.essence_str())?;

        let mut form = Form::new();
        if let Some(folder_id) = folder_id {
            form = form.text("folderId", folder_id.to_string());
        }
        let form = form.part("file", part);

        let request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .multipart(form)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if status == StatusCode::CREATED || status == StatusCode::OK {
            let file: RemoteFile = response.json().await?;
            debug!(file_id = %file.id, name = %file.original_name, "Upload accepted");
            return Ok(file);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("Upload failed").to_string(),
        };
        Err(TransferError::Server {
            status: status.as_u16(),
            message,
        })
    }
}
