//! Blob store trait for uploaded file content.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::result::AppResult;

/// A byte stream produced by the blob store when reading content.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// A byte stream handed to the blob store for writing.
///
/// Borrowing is allowed so a request body can be piped through without
/// first being copied into an owned buffer.
pub type UploadStream<'a> = BoxStream<'a, Result<Bytes, std::io::Error>>;

/// Metadata about a stored blob.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlobMeta {
    /// Key within the store.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Durable byte storage keyed by opaque per-user paths.
///
/// Blobs are written once when created and never rewritten in place. The
/// trait is defined here in `nimbus-core` and implemented in
/// `nimbus-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g. "local").
    fn provider_type(&self) -> &str;

    /// Check whether the backend is reachable and writable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a stream to a new blob, returning the number of bytes written.
    ///
    /// If the stream yields an error, any partially written blob is removed
    /// and the error is returned.
    async fn write_stream<'a>(&self, key: &str, stream: UploadStream<'a>) -> AppResult<u64>;

    /// Stream the whole blob.
    async fn read(&self, key: &str) -> AppResult<ByteStream>;

    /// Stream `len` bytes starting at byte offset `start`.
    async fn read_range(&self, key: &str, start: u64, len: u64) -> AppResult<ByteStream>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Get size and modification time of a blob.
    async fn metadata(&self, key: &str) -> AppResult<BlobMeta>;
}
