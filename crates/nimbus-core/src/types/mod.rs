//! Core type definitions used across the Nimbus workspace.

pub mod id;

pub use id::*;
