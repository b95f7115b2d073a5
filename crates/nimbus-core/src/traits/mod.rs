//! Traits defined in `nimbus-core` and implemented by other crates.

pub mod storage;

pub use storage::{BlobMeta, BlobStore, ByteStream, UploadStream};
