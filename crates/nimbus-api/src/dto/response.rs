//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nimbus_entity::user::User;
use nimbus_service::folder::PurgeSummary;
use nimbus_service::user::AuthSession;

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Register and login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The signed-in user, without secrets.
    pub user: User,
    /// Bearer token.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user,
            token: session.token,
            expires_at: session.expires_at,
        }
    }
}

/// Result of a reset-key password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    /// Outcome.
    pub message: String,
    /// The key that replaces the one just used.
    pub new_reset_key: String,
}

/// Result of a profile picture upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureResponse {
    /// URL the picture is served from.
    pub profile_picture: String,
    /// The updated user.
    pub user: User,
}

/// Result of a permanent folder delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    /// Outcome.
    pub message: String,
    /// Folders removed, the requested one included.
    pub folders_deleted: usize,
    /// Files removed from inside them.
    pub files_deleted: usize,
}

impl From<PurgeSummary> for PurgeResponse {
    fn from(summary: PurgeSummary) -> Self {
        Self {
            message: "Folder permanently deleted".to_string(),
            folders_deleted: summary.folders_deleted,
            files_deleted: summary.files_deleted,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Database reachability.
    pub database: String,
    /// Blob store reachability.
    pub storage: String,
}
