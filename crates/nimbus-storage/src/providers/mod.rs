//! Blob store backends.

pub mod local;
