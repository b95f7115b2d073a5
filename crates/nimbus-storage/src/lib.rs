//! # nimbus-storage
//!
//! Blob store implementations for Nimbus Drive. Content lives under one
//! partition per user and every blob name is generated server-side, so a
//! client-supplied filename never becomes part of a storage key.

pub mod key;
pub mod providers;

pub use key::BlobKey;
pub use providers::local::LocalBlobStore;
