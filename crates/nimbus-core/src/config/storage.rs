//! Blob storage and ingestion limits.

use serde::{Deserialize, Serialize};

/// Blob store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory under which each user gets a blob partition.
    #[serde(default = "default_root_path")]
    pub root_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
        }
    }
}

/// Limits applied by the multipart ingestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum size of a single uploaded file (default 1000 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Maximum number of multipart fields per request.
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
    /// Maximum size of a non-file text field (default 25 MiB).
    #[serde(default = "default_max_field_size")]
    pub max_field_size_bytes: usize,
    /// Files larger than this are logged at info level on arrival.
    #[serde(default = "default_large_file_threshold")]
    pub large_file_log_threshold_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            max_fields: default_max_fields(),
            max_field_size_bytes: default_max_field_size(),
            large_file_log_threshold_bytes: default_large_file_threshold(),
        }
    }
}

impl UploadConfig {
    /// Upper bound for a whole request body: one file plus its text fields.
    pub fn max_request_bytes(&self) -> usize {
        let fields = self.max_field_size_bytes.saturating_mul(self.max_fields);
        usize::try_from(self.max_file_size_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(fields)
    }
}

fn default_root_path() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    1000 * 1024 * 1024
}

fn default_max_fields() -> usize {
    10
}

fn default_max_field_size() -> usize {
    25 * 1024 * 1024
}

fn default_large_file_threshold() -> u64 {
    100 * 1024 * 1024
}
