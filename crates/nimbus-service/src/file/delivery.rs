//! Media delivery: inline previews and attachment downloads.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use nimbus_core::error::AppError;
use nimbus_core::traits::{BlobStore, ByteStream};
use nimbus_core::types::FileId;
use nimbus_entity::file::File;

use super::range::{ByteRange, RangeRequest};
use super::service::FileService;
use crate::context::RequestContext;

/// How the client should present the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Render in place.
    Inline,
    /// Save under the original file name.
    Attachment,
}

/// The bytes to send for a delivery.
pub enum MediaBody {
    /// The whole blob.
    Full {
        /// Content stream.
        stream: ByteStream,
        /// Blob size in bytes.
        len: u64,
    },
    /// One byte range of the blob.
    Partial {
        /// Stream of exactly `range.size()` bytes.
        stream: ByteStream,
        /// The range being served.
        range: ByteRange,
        /// Blob size in bytes.
        total: u64,
    },
    /// The requested range lies outside the blob.
    Unsatisfiable {
        /// Blob size in bytes.
        total: u64,
    },
}

impl fmt::Debug for MediaBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { len, .. } => f.debug_struct("Full").field("len", len).finish(),
            Self::Partial { range, total, .. } => f
                .debug_struct("Partial")
                .field("range", range)
                .field("total", total)
                .finish(),
            Self::Unsatisfiable { total } => {
                f.debug_struct("Unsatisfiable").field("total", total).finish()
            }
        }
    }
}

/// A resolved file together with the body to deliver.
#[derive(Debug)]
pub struct Media {
    /// File metadata.
    pub file: File,
    /// Presentation hint.
    pub disposition: Disposition,
    /// What to send.
    pub body: MediaBody,
}

impl Media {
    /// The `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        match self.disposition {
            Disposition::Inline => "inline".to_string(),
            Disposition::Attachment => attachment_header(&self.file.original_name),
        }
    }

    /// Whether range requests are honored for this file.
    pub fn accepts_ranges(&self) -> bool {
        self.disposition == Disposition::Inline && self.file.is_video()
    }
}

/// Serves file content, scoped to the owner.
#[derive(Debug, Clone)]
pub struct DeliveryService {
    /// Lifecycle service for the ownership-scoped lookup.
    files: FileService,
    /// Blob store holding content.
    blobs: Arc<dyn BlobStore>,
}

impl DeliveryService {
    /// Creates a new delivery service.
    pub fn new(files: FileService, blobs: Arc<dyn BlobStore>) -> Self {
        Self { files, blobs }
    }

    /// Inline preview. For video files a single `Range` is honored.
    pub async fn preview(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        range_header: Option<&str>,
    ) -> Result<Media, AppError> {
        let file = self.files.get_file(ctx, file_id).await?;
        let total = self.blobs.metadata(&file.path).await?.size_bytes;

        let request = if file.is_video() {
            RangeRequest::parse(range_header, total)
        } else {
            RangeRequest::Full
        };

        let body = match request {
            RangeRequest::Full => MediaBody::Full {
                stream: self.blobs.read(&file.path).await?,
                len: total,
            },
            RangeRequest::Partial(range) => {
                debug!(
                    file_id = %file_id,
                    start = range.start,
                    end = range.end,
                    "Serving byte range"
                );
                MediaBody::Partial {
                    stream: self.blobs.read_range(&file.path, range.start, range.size()).await?,
                    range,
                    total,
                }
            }
            RangeRequest::Unsatisfiable => MediaBody::Unsatisfiable { total },
        };

        Ok(Media {
            file,
            disposition: Disposition::Inline,
            body,
        })
    }

    /// Attachment download of the whole file under its original name.
    pub async fn download(&self, ctx: &RequestContext, file_id: FileId) -> Result<Media, AppError> {
        let file = self.files.get_file(ctx, file_id).await?;
        let total = self.blobs.metadata(&file.path).await?.size_bytes;
        let stream = self.blobs.read(&file.path).await?;

        Ok(Media {
            file,
            disposition: Disposition::Attachment,
            body: MediaBody::Full { stream, len: total },
        })
    }
}

/// `attachment` with the original name, plus an RFC 5987 `filename*` when
/// the name is not plain ASCII.
fn attachment_header(original_name: &str) -> String {
    let fallback: String = original_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if original_name.is_ascii() && !original_name.chars().any(|c| c.is_ascii_control()) {
        return format!("attachment; filename=\"{fallback}\"");
    }

    let mut encoded = String::with_capacity(original_name.len() * 3);
    for byte in original_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
