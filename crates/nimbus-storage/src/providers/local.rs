//! Local filesystem blob store.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_core::traits::storage::{BlobMeta, BlobStore, ByteStream, UploadStream};

/// Blob store backed by a directory on the local filesystem.
///
/// Keys are relative paths such as `7/1767225600000-123456.png`; the first
/// segment is the owner's partition.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at the given path, creating it if needed.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path inside the root.
    ///
    /// Only plain relative segments are accepted, so a key can never
    /// address anything outside the root.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let clean = key.trim_start_matches('/');
        let relative = Path::new(clean);
        let is_plain = !clean.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(AppError::validation(format!("Invalid blob key: {key}")));
        }
        Ok(self.root.join(relative))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    async fn open(&self, key: &str) -> AppResult<fs::File> {
        let full_path = self.resolve(key)?;
        fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("File not found on disk")
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to open blob: {key}"), e)
            }
        })
    }

    /// Remove a partially written blob after a failed write.
    async fn discard_partial(&self, path: &Path, key: &str) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key, error = %e, "Failed to remove partial blob");
            }
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match fs::metadata(&self.root).await {
            Ok(meta) => Ok(meta.is_dir() && !meta.permissions().readonly()),
            Err(_) => Ok(false),
        }
    }

    async fn write_stream<'a>(&self, key: &str, mut stream: UploadStream<'a>) -> AppResult<u64> {
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    AppError::conflict(format!("Blob already exists: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to create blob: {key}"),
                        e,
                    )
                }
            })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let written = match chunk {
                Ok(chunk) => file.write_all(&chunk).await.map(|()| chunk.len() as u64),
                Err(e) => Err(e),
            };
            match written {
                Ok(n) => total_bytes += n,
                Err(e) => {
                    drop(file);
                    self.discard_partial(&full_path, key).await;
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to write blob: {key}"),
                        e,
                    ));
                }
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            self.discard_partial(&full_path, key).await;
            return Err(AppError::with_source(ErrorKind::Storage, "Failed to flush blob", e));
        }

        debug!(key, bytes = total_bytes, "Wrote blob from stream");
        Ok(total_bytes)
    }

    async fn read(&self, key: &str) -> AppResult<ByteStream> {
        let file = self.open(key).await?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn read_range(&self, key: &str, start: u64, len: u64) -> AppResult<ByteStream> {
        let mut file = self.open(key).await?;
        file.seek(SeekFrom::Start(start)).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to seek blob: {key}"), e)
        })?;
        Ok(Box::pin(ReaderStream::new(file.take(len))))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob: {key}"),
                e,
            )),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_path = self.resolve(key)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn metadata(&self, key: &str) -> AppResult<BlobMeta> {
        let full_path = self.resolve(key)?;
        let meta = fs::metadata(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found("File not found on disk")
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to get metadata: {key}"),
                    e,
                )
            }
        })?;

        Ok(BlobMeta {
            key: key.to_string(),
            size_bytes: meta.len(),
            last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
        })
    }
}
