//! # nimbus-service
//!
//! Business logic service layer for Nimbus Drive. Each service
//! orchestrates repositories, the blob store, and credentials to implement
//! one group of use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod achievement;
pub mod context;
pub mod file;
pub mod folder;
pub mod user;

pub use achievement::AchievementService;
pub use context::RequestContext;
pub use file::{DeliveryService, FileService, UploadService};
pub use folder::FolderService;
pub use user::AccountService;

#[cfg(test)]
pub(crate) mod test_support;
