//! Achievement catalog and per-user unlock records.

use chrono::{DateTime, Utc};
use nimbus_core::types::{AchievementId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A static catalog entry, seeded by migration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Catalog id.
    pub id: AchievementId,
    /// Stable key such as `first_upload`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Icon identifier for the client.
    pub icon: String,
    /// Threshold the metric must reach.
    pub requirement: i64,
    /// Points awarded.
    pub points: i64,
    /// Grouping shown in the UI.
    pub category: String,
}

impl Achievement {
    /// The statistic this achievement is measured against.
    pub fn metric(&self) -> Option<AchievementMetric> {
        AchievementMetric::for_key(&self.key)
    }
}

/// A user's unlock of one achievement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserAchievement {
    /// Row id.
    pub id: i64,
    /// The user.
    pub user_id: UserId,
    /// The unlocked achievement.
    pub achievement_id: AchievementId,
    /// Progress recorded at unlock time.
    pub progress: i64,
    /// When it was unlocked.
    pub unlocked_at: DateTime<Utc>,
}

/// The statistic an achievement key is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementMetric {
    /// Active files.
    Files,
    /// Active folders.
    Folders,
    /// Active starred files.
    Favorites,
    /// Active `image/*` files.
    Images,
    /// Active `video/*` files.
    Videos,
    /// Active documents, PDFs included.
    Documents,
    /// At least one folder has a parent.
    NestedFolders,
    /// Unlocked for every account.
    Always,
}

impl AchievementMetric {
    /// Map a catalog key to its metric. Unknown keys never unlock.
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            "first_upload" | "file_collector" | "storage_master" => Some(Self::Files),
            "organizer" | "folder_architect" => Some(Self::Folders),
            "favorite_finder" | "star_collector" => Some(Self::Favorites),
            "image_lover" => Some(Self::Images),
            "video_enthusiast" => Some(Self::Videos),
            "document_keeper" => Some(Self::Documents),
            "nested_genius" => Some(Self::NestedFolders),
            "early_adopter" => Some(Self::Always),
            _ => None,
        }
    }
}
