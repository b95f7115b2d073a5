//! Account operations: registration, login, profile, and password reset.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use nimbus_auth::jwt::JwtEncoder;
use nimbus_auth::password::{PasswordHasher, PasswordValidator};
use nimbus_auth::reset_key::generate_reset_key;
use nimbus_core::error::AppError;
use nimbus_core::traits::{BlobStore, ByteStream};
use nimbus_database::repositories::UserRepository;
use nimbus_entity::user::{CreateUser, UpdateProfile, User};

use crate::context::RequestContext;
use crate::file::StoredBlob;

/// Warning shipped inside every downloaded reset-key document.
const RESET_KEY_WARNING: &str = "Keep this file safe! It's the only way to reset your password.";

/// Handles accounts and credentials.
#[derive(Debug, Clone)]
pub struct AccountService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Blob store, for profile pictures.
    blobs: Arc<dyn BlobStore>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password validator.
    validator: Arc<PasswordValidator>,
    /// Token issuer.
    encoder: Arc<JwtEncoder>,
}

/// Registration input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Display name; defaults to the username.
    pub display_name: Option<String>,
}

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// The user.
    pub user: User,
    /// Bearer token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// The downloadable reset-key document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetKeyDocument {
    /// Account the key belongs to.
    pub username: String,
    /// The one currently valid reset key.
    pub reset_key: String,
    /// When this document was produced.
    pub generated_at: DateTime<Utc>,
    /// Safekeeping reminder.
    pub warning: String,
}

/// A profile picture ready to stream.
pub struct ProfilePicture {
    /// Content stream.
    pub stream: ByteStream,
    /// MIME type guessed from the stored key.
    pub mime_type: String,
    /// Size in bytes.
    pub len: u64,
}

impl std::fmt::Debug for ProfilePicture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilePicture")
            .field("mime_type", &self.mime_type)
            .field("len", &self.len)
            .finish()
    }
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        blobs: Arc<dyn BlobStore>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        encoder: Arc<JwtEncoder>,
    ) -> Self {
        Self {
            user_repo,
            blobs,
            hasher,
            validator,
            encoder,
        }
    }

    /// Registers a new account with a fresh reset key and signs it in.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthSession, AppError> {
        let username = req.username.trim().to_string();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(AppError::validation(
                "Username is required and must not contain spaces",
            ));
        }
        let email = req.email.trim().to_string();
        if !email.contains('@') {
            return Err(AppError::validation("A valid email address is required"));
        }
        self.validator.validate(&req.password)?;

        let display_name = req
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| username.clone());

        let password_hash = self.hash(req.password).await?;
        let user = self
            .user_repo
            .create(&CreateUser {
                username,
                email,
                password_hash,
                display_name,
                reset_key: generate_reset_key(),
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.session_for(user)
    }

    /// Verifies credentials and issues a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AppError> {
        let invalid = || AppError::authentication("Invalid username or password");

        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;

        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))??;

        if !matches {
            warn!(username = %user.username, "Failed login attempt");
            return Err(invalid());
        }

        info!(user_id = %user.id, "User logged in");
        self.session_for(user)
    }

    /// The caller's account.
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Applies a partial profile update.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        mut update: UpdateProfile,
    ) -> Result<User, AppError> {
        if let Some(name) = update.display_name.take() {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::validation("Display name must not be empty"));
            }
            update.display_name = Some(name.to_string());
        }
        if let Some(language) = update.language.as_deref() {
            if language.trim().is_empty() {
                return Err(AppError::validation("Language must not be empty"));
            }
        }

        if update.is_empty() {
            return self.current_user(ctx).await;
        }

        let user = self.user_repo.update_profile(ctx.user_id, &update).await?;
        info!(user_id = %ctx.user_id, "Profile updated");
        Ok(user)
    }

    /// Records an uploaded image as the profile picture and removes the
    /// previous one. Non-image content is discarded and rejected.
    pub async fn set_profile_picture(
        &self,
        ctx: &RequestContext,
        blob: StoredBlob,
        mime_type: &str,
    ) -> Result<User, AppError> {
        if !mime_type.starts_with("image/") {
            self.remove_blob(&blob.key).await;
            return Err(AppError::validation("Profile picture must be an image"));
        }

        let updated = self
            .user_repo
            .set_profile_picture(ctx.user_id, &blob.key)
            .await;
        let (before, after) = match updated {
            Ok(pair) => pair,
            Err(e) => {
                self.remove_blob(&blob.key).await;
                return Err(e);
            }
        };

        if let Some(old) = before.profile_picture.filter(|old| *old != blob.key) {
            self.remove_blob(&old).await;
        }

        info!(user_id = %ctx.user_id, "Profile picture updated");
        Ok(after)
    }

    /// Streams the caller's profile picture.
    pub async fn profile_picture(&self, ctx: &RequestContext) -> Result<ProfilePicture, AppError> {
        let user = self.current_user(ctx).await?;
        let key = user
            .profile_picture
            .ok_or_else(|| AppError::not_found("No profile picture"))?;

        let len = self.blobs.metadata(&key).await?.size_bytes;
        let stream = self.blobs.read(&key).await?;
        let mime_type = mime_guess::from_path(&key)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(ProfilePicture {
            stream,
            mime_type,
            len,
        })
    }

    /// The caller's current reset key, packaged for download.
    pub async fn reset_key_document(
        &self,
        ctx: &RequestContext,
    ) -> Result<ResetKeyDocument, AppError> {
        let user = self.current_user(ctx).await?;
        Ok(ResetKeyDocument {
            username: user.username,
            reset_key: user.current_reset_key,
            generated_at: Utc::now(),
            warning: RESET_KEY_WARNING.to_string(),
        })
    }

    /// Sets a new password for whoever holds `reset_key` and returns the
    /// replacement key.
    ///
    /// The key swap and password change are one conditional update on the
    /// old key, so of two concurrent resets with the same key exactly one
    /// succeeds and the old key is dead the moment it does.
    pub async fn reset_password(
        &self,
        reset_key: &str,
        new_password: &str,
    ) -> Result<String, AppError> {
        self.validator.validate(new_password)?;
        let reset_key = reset_key.trim();
        if reset_key.is_empty() {
            return Err(AppError::validation("Invalid reset key"));
        }

        let password_hash = self.hash(new_password.to_string()).await?;
        let new_key = generate_reset_key();

        let user = self
            .user_repo
            .rotate_reset_key(reset_key, &new_key, &password_hash)
            .await?
            .ok_or_else(|| AppError::validation("Invalid reset key"))?;

        info!(user_id = %user.id, "Password reset with reset key");
        Ok(user.current_reset_key)
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AppError> {
        let issued = self.encoder.issue(user.id, &user.username)?;
        Ok(AuthSession {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }

    async fn remove_blob(&self, key: &str) {
        if let Err(e) = self.blobs.delete(key).await {
            warn!(key, error = %e, "Failed to delete profile picture blob");
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;
    use nimbus_core::error::ErrorKind;

    use super::*;
    use crate::test_support::Harness;

    fn register(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "secret123".to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let h = Harness::new().await;
        let session = h.accounts.register(register("alice")).await.unwrap();
        assert_eq!(session.user.display_name, "alice");
        assert!(!session.token.is_empty());

        let again = h.accounts.login("alice", "secret123").await.unwrap();
        assert_eq!(again.user.id, session.user.id);

        let err = h.accounts.login("alice", "wrong-password").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        let err = h.accounts.login("nobody", "secret123").await.unwrap_err();
        assert_eq!(err.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let h = Harness::new().await;
        let mut req = register("alice");
        req.password = "123".to_string();
        let err = h.accounts.register(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_reset_rotates_key_exactly_once() {
        let h = Harness::new().await;
        let session = h.accounts.register(register("alice")).await.unwrap();
        let ctx = RequestContext::new(session.user.id, "alice");
        let old_key = h.accounts.reset_key_document(&ctx).await.unwrap().reset_key;

        let new_key = h.accounts.reset_password(&old_key, "brand-new-pass").await.unwrap();
        assert_ne!(new_key, old_key);
        assert_eq!(h.accounts.reset_key_document(&ctx).await.unwrap().reset_key, new_key);

        let err = h.accounts.reset_password(&old_key, "another-pass").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Invalid reset key");

        assert!(h.accounts.login("alice", "brand-new-pass").await.is_ok());
        assert!(h.accounts.login("alice", "secret123").await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_resets_with_one_key() {
        let h = Harness::new().await;
        let session = h.accounts.register(register("alice")).await.unwrap();
        let ctx = RequestContext::new(session.user.id, "alice");
        let key = h.accounts.reset_key_document(&ctx).await.unwrap().reset_key;

        let (a, b) = tokio::join!(
            h.accounts.reset_password(&key, "password-one"),
            h.accounts.reset_password(&key, "password-two"),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_blank_display_name_is_rejected() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let err = h
            .accounts
            .update_profile(
                &alice,
                UpdateProfile {
                    display_name: Some("  ".to_string()),
                    ..UpdateProfile::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_profile_picture_replaces_previous() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let png = || -> nimbus_core::traits::UploadStream<'static> {
            Box::pin(stream::iter(vec![Ok(Bytes::from_static(b"\x89PNG"))]))
        };

        let first = h.uploads.store_avatar(&alice, "me.png", png()).await.unwrap();
        let user = h
            .accounts
            .set_profile_picture(&alice, first.clone(), "image/png")
            .await
            .unwrap();
        assert_eq!(user.profile_picture.as_deref(), Some(first.key.as_str()));

        let second = h.uploads.store_avatar(&alice, "me2.png", png()).await.unwrap();
        h.accounts.set_profile_picture(&alice, second.clone(), "image/png").await.unwrap();
        assert!(!h.blobs.exists(&first.key).await.unwrap());

        let picture = h.accounts.profile_picture(&alice).await.unwrap();
        assert_eq!(picture.mime_type, "image/png");
        assert_eq!(picture.len, 4);

        let text = h.uploads.store_avatar(&alice, "notes.txt", png()).await.unwrap();
        let err = h
            .accounts
            .set_profile_picture(&alice, text.clone(), "text/plain")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!h.blobs.exists(&text.key).await.unwrap());
    }
}
