//! Things that can be uploaded.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::io::ReaderStream;

/// Body stream handed to the transport.
pub type SourceStream = BoxStream<'static, io::Result<Bytes>>;

/// One file to upload.
pub enum UploadSource {
    /// A file on disk, named after its last path component.
    Path(PathBuf),
    /// In-memory content.
    Bytes {
        /// File name sent to the server.
        name: String,
        /// Content.
        data: Bytes,
    },
    /// Content produced on the fly.
    Stream {
        /// File name sent to the server.
        name: String,
        /// Number of bytes the stream will yield.
        len: u64,
        /// Content.
        stream: SourceStream,
    },
}

impl std::fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes { name, data } => f
                .debug_struct("Bytes")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
            Self::Stream { name, len, .. } => f
                .debug_struct("Stream")
                .field("name", name)
                .field("len", len)
                .finish(),
        }
    }
}

/// A source opened for sending.
pub struct OpenedSource {
    /// File name sent to the server.
    pub name: String,
    /// Content length.
    pub len: u64,
    /// Content.
    pub stream: SourceStream,
}

impl UploadSource {
    /// The name shown while the transfer is in flight.
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Bytes { name, .. } | Self::Stream { name, .. } => name.clone(),
        }
    }

    /// Opens the source for reading.
    pub async fn open(self) -> io::Result<OpenedSource> {
        let name = self.display_name();
        match self {
            Self::Path(path) => {
                let file = tokio::fs::File::open(&path).await?;
                let len = file.metadata().await?.len();
                Ok(OpenedSource {
                    name,
                    len,
                    stream: ReaderStream::new(file).boxed(),
                })
            }
            Self::Bytes { data, .. } => Ok(OpenedSource {
                name,
                len: data.len() as u64,
                stream: stream::once(async move { Ok(data) }).boxed(),
            }),
            Self::Stream { len, stream, .. } => Ok(OpenedSource { name, len, stream }),
        }
    }
}
