//! File entity model.

use chrono::{DateTime, Utc};
use nimbus_core::types::{FileId, FolderId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata for one uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// Generated stored name (timestamp plus random suffix).
    pub name: String,
    /// Name the user uploaded the file under.
    pub original_name: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Blob store key, `{user_id}/{name}`.
    pub path: String,
    /// The owner.
    pub user_id: UserId,
    /// Containing folder (None for the root).
    pub folder_id: Option<FolderId>,
    /// Starred by the owner.
    pub is_favorite: bool,
    /// In the trash.
    pub is_deleted: bool,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
}

impl File {
    /// Whether preview should honor HTTP range requests.
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// Generated stored name.
    pub name: String,
    /// User-facing name.
    pub original_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Blob store key.
    pub path: String,
    /// Target folder.
    pub folder_id: Option<FolderId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(original_name: &str, mime_type: &str) -> File {
        File {
            id: FileId(1),
            name: "1700000000000-123.mp4".to_string(),
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
            size: 10,
            path: "1/1700000000000-123.mp4".to_string(),
            user_id: UserId(1),
            folder_id: None,
            is_favorite: false,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample("a.mp4", "video/mp4")).expect("serialize");
        assert_eq!(json["originalName"], "a.mp4");
        assert_eq!(json["mimeType"], "video/mp4");
        assert_eq!(json["isFavorite"], false);
        assert!(json["folderId"].is_null());
    }

    #[test]
    fn test_is_video() {
        assert!(sample("a.mp4", "video/mp4").is_video());
        assert!(!sample("a.png", "image/png").is_video());
    }
}
