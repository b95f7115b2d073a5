//! Achievement catalog and unlock repository.

use chrono::Utc;
use sqlx::SqlitePool;

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_core::types::{AchievementId, UserId};
use nimbus_entity::achievement::{Achievement, UserAchievement};

/// Repository for the achievement catalog and per-user unlocks.
#[derive(Debug, Clone)]
pub struct AchievementRepository {
    pool: SqlitePool,
}

impl AchievementRepository {
    /// Create a new achievement repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The whole catalog in seed order.
    pub async fn list_catalog(&self) -> AppResult<Vec<Achievement>> {
        sqlx::query_as::<_, Achievement>("SELECT * FROM achievements ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list achievements", e)
            })
    }

    /// Unlock records of a user, oldest first.
    pub async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserAchievement>> {
        sqlx::query_as::<_, UserAchievement>(
            "SELECT * FROM user_achievements WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list user achievements", e)
        })
    }

    /// Insert an unlock record unless one already exists.
    ///
    /// Returns `None` when the user already had the achievement; the
    /// UNIQUE(user_id, achievement_id) constraint makes this safe under
    /// concurrent evaluation.
    pub async fn unlock(
        &self,
        user_id: UserId,
        achievement_id: AchievementId,
        progress: i64,
    ) -> AppResult<Option<UserAchievement>> {
        sqlx::query_as::<_, UserAchievement>(
            "INSERT INTO user_achievements (user_id, achievement_id, progress, unlocked_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id, achievement_id) DO NOTHING RETURNING *",
        )
        .bind(user_id)
        .bind(achievement_id)
        .bind(progress)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to unlock achievement", e))
    }
}
