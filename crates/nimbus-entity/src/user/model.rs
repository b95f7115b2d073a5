//! User entity model.

use chrono::{DateTime, Utc};
use nimbus_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Blob store key of the profile picture, if one was uploaded.
    pub profile_picture: Option<String>,
    /// The one reset key that is currently valid.
    #[serde(skip_serializing)]
    pub current_reset_key: String,
    /// UI language code.
    pub language: String,
    /// Free-form client preferences.
    pub preferences: Json<serde_json::Value>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Already hashed password.
    pub password_hash: String,
    /// Display name.
    pub display_name: String,
    /// Initial reset key.
    pub reset_key: String,
}

/// Partial profile update. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    /// New display name.
    pub display_name: Option<String>,
    /// New language code.
    pub language: Option<String>,
    /// Replacement preferences document.
    pub preferences: Option<serde_json::Value>,
}

impl UpdateProfile {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.language.is_none() && self.preferences.is_none()
    }
}
