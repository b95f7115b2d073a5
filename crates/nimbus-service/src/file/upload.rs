//! File ingestion: stream an upload into the blob store, then record it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tracing::{info, warn};

use nimbus_core::config::UploadConfig;
use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::traits::{BlobStore, UploadStream};
use nimbus_core::types::FolderId;
use nimbus_entity::file::{CreateFile, File};
use nimbus_storage::BlobKey;

use super::service::FileService;
use crate::context::RequestContext;

/// MIME type used when neither the client nor the extension says more.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Content that has been written to the blob store but not yet recorded.
///
/// Hand it to [`UploadService::finalize`] to create the file row, or to
/// [`UploadService::discard`] to drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Blob store key.
    pub key: String,
    /// Generated file name within the owner's partition.
    pub name: String,
    /// Bytes written.
    pub size: u64,
}

/// Handles single-file multipart ingestion.
///
/// Each upload is two steps so that a request body can be consumed in
/// whatever order its fields arrive: the content is streamed into the
/// caller's partition first, and the metadata row is created once the
/// remaining form fields are known. Any failure after the first step
/// removes the blob again.
#[derive(Debug, Clone)]
pub struct UploadService {
    /// Lifecycle service creating the file row.
    files: FileService,
    /// Blob store receiving content.
    blobs: Arc<dyn BlobStore>,
    /// Upload limits.
    config: UploadConfig,
}

/// What went wrong with the incoming stream itself, as opposed to the
/// blob store.
#[derive(Debug, Default)]
struct StreamOutcome {
    exceeded: AtomicBool,
    interrupted: AtomicBool,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(files: FileService, blobs: Arc<dyn BlobStore>, config: UploadConfig) -> Self {
        Self {
            files,
            blobs,
            config,
        }
    }

    /// The configured upload limits.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Streams file content into a freshly generated key in the caller's
    /// partition.
    pub async fn store_upload<'a>(
        &self,
        ctx: &RequestContext,
        original_name: &str,
        stream: UploadStream<'a>,
    ) -> Result<StoredBlob, AppError> {
        let key = BlobKey::generate(ctx.user_id, original_name);
        self.store(key, stream).await
    }

    /// Streams a profile picture into the caller's partition.
    pub async fn store_avatar<'a>(
        &self,
        ctx: &RequestContext,
        original_name: &str,
        stream: UploadStream<'a>,
    ) -> Result<StoredBlob, AppError> {
        let key = BlobKey::profile_picture(ctx.user_id, original_name);
        self.store(key, stream).await
    }

    /// Records stored content as a new file.
    ///
    /// The target folder must be one of the caller's active folders. On
    /// any failure the blob is removed before the error is returned.
    pub async fn finalize(
        &self,
        ctx: &RequestContext,
        blob: StoredBlob,
        original_name: &str,
        declared_mime: Option<&str>,
        folder_id: Option<FolderId>,
    ) -> Result<File, AppError> {
        let size = match i64::try_from(blob.size) {
            Ok(size) => size,
            Err(_) => {
                self.discard(&blob).await;
                return Err(AppError::validation("File exceeds maximum upload size"));
            }
        };

        let data = CreateFile {
            name: blob.name.clone(),
            original_name: display_name(original_name),
            mime_type: resolve_mime(declared_mime, original_name),
            size,
            path: blob.key.clone(),
            folder_id,
        };

        match self.files.create_file(ctx, &data).await {
            Ok(file) => {
                if blob.size > self.config.large_file_log_threshold_bytes {
                    info!(
                        user_id = %ctx.user_id,
                        file_id = %file.id,
                        size_mb = blob.size / (1024 * 1024),
                        "Large file upload completed"
                    );
                }
                Ok(file)
            }
            Err(e) => {
                self.discard(&blob).await;
                Err(e)
            }
        }
    }

    /// Drops stored content that will never be recorded.
    pub async fn discard(&self, blob: &StoredBlob) {
        if let Err(e) = self.blobs.delete(&blob.key).await {
            warn!(key = %blob.key, error = %e, "Failed to discard unrecorded blob");
        }
    }

    async fn store<'a>(
        &self,
        key: BlobKey,
        stream: UploadStream<'a>,
    ) -> Result<StoredBlob, AppError> {
        let limit = self.config.max_file_size_bytes;
        let outcome = Arc::new(StreamOutcome::default());
        let observed = Arc::clone(&outcome);
        let mut seen = 0u64;

        let limited: UploadStream<'a> = Box::pin(stream.map(move |chunk| {
            let chunk = chunk.inspect_err(|_| observed.interrupted.store(true, Ordering::Relaxed))?;
            seen += chunk.len() as u64;
            if seen > limit {
                observed.exceeded.store(true, Ordering::Relaxed);
                return Err(std::io::Error::other("upload exceeds size limit"));
            }
            Ok(chunk)
        }));

        let path = key.as_path();
        match self.blobs.write_stream(&path, limited).await {
            Ok(size) => Ok(StoredBlob {
                key: path,
                name: key.file_name().to_string(),
                size,
            }),
            Err(_) if outcome.exceeded.load(Ordering::Relaxed) => Err(AppError::validation(
                format!("File exceeds maximum upload size of {limit} bytes"),
            )),
            Err(e) if outcome.interrupted.load(Ordering::Relaxed) => Err(AppError::with_source(
                ErrorKind::Validation,
                "Upload was interrupted before the file was complete",
                e,
            )),
            Err(e) => Err(e),
        }
    }
}

/// The MIME type to record: the client's declaration when it is specific,
/// otherwise a guess from the extension.
pub fn resolve_mime(declared: Option<&str>, original_name: &str) -> String {
    let declared = declared
        .map(str::trim)
        .filter(|m| !m.is_empty() && *m != FALLBACK_MIME);
    match declared {
        Some(mime) => mime.to_ascii_lowercase(),
        None => mime_guess::from_path(original_name)
            .first_raw()
            .unwrap_or(FALLBACK_MIME)
            .to_string(),
    }
}

/// The user-facing name with any client path stripped.
fn display_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() {
        "untitled".to_string()
    } else {
        base.to_string()
    }
}
