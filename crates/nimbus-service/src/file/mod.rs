//! File lifecycle, ingestion, and media delivery.

pub mod delivery;
pub mod range;
pub mod service;
pub mod upload;

pub use delivery::{DeliveryService, Disposition, Media, MediaBody};
pub use range::{ByteRange, RangeRequest};
pub use service::FileService;
pub use upload::{StoredBlob, UploadService};
