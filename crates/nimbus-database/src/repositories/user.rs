//! User repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_core::types::UserId;
use nimbus_entity::user::{CreateUser, UpdateProfile, User};

/// Repository for accounts, profiles, and reset keys.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER(?)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    /// Create a new user.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users \
             (username, email, password_hash, display_name, current_reset_key, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.display_name)
        .bind(&data.reset_key)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            crate::map_unique_violation(
                e,
                |message| {
                    if message.contains("users.username") {
                        Some(format!("Username '{}' already exists", data.username))
                    } else if message.contains("users.email") {
                        Some("Email already in use".to_string())
                    } else {
                        None
                    }
                },
                "Failed to create user",
            )
        })
    }

    /// Apply a partial profile update.
    pub async fn update_profile(&self, id: UserId, data: &UpdateProfile) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET display_name = COALESCE(?, display_name), \
                              language = COALESCE(?, language), \
                              preferences = COALESCE(?, preferences) \
             WHERE id = ? RETURNING *",
        )
        .bind(&data.display_name)
        .bind(&data.language)
        .bind(data.preferences.clone().map(Json))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update profile", e))?
        .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Record the blob key of a new profile picture, returning the user as
    /// it was before the change so the caller can clean up the old blob.
    pub async fn set_profile_picture(&self, id: UserId, key: &str) -> AppResult<(User, User)> {
        let db_err = |e: sqlx::Error| {
            AppError::with_source(ErrorKind::Database, "Failed to set profile picture", e)
        };

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let before = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let after = sqlx::query_as::<_, User>(
            "UPDATE users SET profile_picture = ? WHERE id = ? RETURNING *",
        )
        .bind(key)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok((before, after))
    }

    /// Replace the password and reset key of whoever currently holds
    /// `old_key`, in one conditional statement.
    ///
    /// Returns `None` when no account holds that key, which includes a key
    /// that was valid a moment ago but has just been rotated by a
    /// concurrent reset.
    pub async fn rotate_reset_key(
        &self,
        old_key: &str,
        new_key: &str,
        password_hash: &str,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = ?, current_reset_key = ? \
             WHERE current_reset_key = ? RETURNING *",
        )
        .bind(password_hash)
        .bind(new_key)
        .bind(old_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rotate reset key", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support;

    fn new_user(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            display_name: username.to_string(),
            reset_key: format!("key-{username}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let repo = UserRepository::new(test_support::pool().await);
        repo.create(&new_user("alice", "a@example.com")).await.unwrap();

        let err = repo.create(&new_user("alice", "other@example.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(err.message.contains("alice"));
    }

    #[tokio::test]
    async fn test_rotate_reset_key_invalidates_old_key() {
        let repo = UserRepository::new(test_support::pool().await);
        let user = repo.create(&new_user("alice", "a@example.com")).await.unwrap();

        let rotated = repo
            .rotate_reset_key("key-alice", "key-next", "new-hash")
            .await
            .unwrap()
            .expect("key should match");
        assert_eq!(rotated.id, user.id);
        assert_eq!(rotated.current_reset_key, "key-next");
        assert_eq!(rotated.password_hash, "new-hash");

        let stale = repo.rotate_reset_key("key-alice", "key-other", "x").await.unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_fields() {
        let repo = UserRepository::new(test_support::pool().await);
        let user = repo.create(&new_user("alice", "a@example.com")).await.unwrap();

        let updated = repo
            .update_profile(
                user.id,
                &UpdateProfile {
                    language: Some("ja".to_string()),
                    ..UpdateProfile::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.language, "ja");
        assert_eq!(updated.display_name, "alice");
        assert_eq!(updated.preferences.0, serde_json::json!({}));
    }
}
