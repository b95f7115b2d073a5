//! Folder entity model.

use chrono::{DateTime, Utc};
use nimbus_core::types::{FolderId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A folder in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// The owner.
    pub user_id: UserId,
    /// Parent folder ID (null for root folders).
    pub parent_id: Option<FolderId>,
    /// In the trash.
    pub is_deleted: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Folder name, already trimmed.
    pub name: String,
    /// Parent folder (None for root).
    pub parent_id: Option<FolderId>,
}
