//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use nimbus_core::types::FolderId;
use nimbus_entity::user::UpdateProfile;
use nimbus_service::user::RegisterRequest as SvcRegister;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Username.
    #[validate(length(min = 1, max = 100, message = "Username is required"))]
    pub username: String,
    /// Email.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Password; the length policy is applied by the account service.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name, defaults to the username.
    #[validate(length(max = 100, message = "Display name is too long"))]
    pub display_name: Option<String>,
}

impl From<RegisterRequest> for SvcRegister {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
            display_name: req.display_name,
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password reset with a reset key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// The key from the downloaded reset-key document.
    #[validate(length(min = 1, message = "Reset key is required"))]
    pub reset_key: String,
    /// New password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// Display name.
    #[validate(length(max = 100, message = "Display name is too long"))]
    pub display_name: Option<String>,
    /// UI language tag.
    #[validate(length(max = 16, message = "Language tag is too long"))]
    pub language: Option<String>,
    /// Free-form client preferences.
    pub preferences: Option<serde_json::Value>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            language: req.language,
            preferences: req.preferences,
        }
    }
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(max = 255, message = "Folder name must be at most 255 characters"))]
    pub name: String,
    /// Parent folder, `null` for the root.
    #[serde(default)]
    pub parent_id: Option<FolderId>,
}

/// Rename folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameFolderRequest {
    /// New name.
    #[validate(length(max = 255, message = "Folder name must be at most 255 characters"))]
    pub name: String,
}

/// Move file request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MoveFileRequest {
    /// Target folder, `null` for the root. The key itself is required.
    #[serde(deserialize_with = "required_nullable")]
    pub folder_id: Option<FolderId>,
}

fn required_nullable<'de, D>(deserializer: D) -> Result<Option<FolderId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<FolderId>::deserialize(deserializer)
}

/// `GET /api/files` query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    /// Folder to list, root when absent.
    pub folder_id: Option<String>,
    /// Category across all folders; wins over `folderId`.
    pub category: Option<String>,
}

/// `GET /api/folders` query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFoldersQuery {
    /// Parent to list, root when absent.
    pub parent_id: Option<String>,
}
