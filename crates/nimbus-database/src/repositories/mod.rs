//! Repository implementations for all Nimbus entities.

pub mod achievement;
pub mod file;
pub mod folder;
pub mod user;

pub use achievement::AchievementRepository;
pub use file::{FileQuery, FileRepository, FolderScope};
pub use folder::{FolderRepository, PurgedSubtree};
pub use user::UserRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use nimbus_core::types::UserId;
    use sqlx::SqlitePool;

    use crate::connection::DatabasePool;
    use crate::migration::run_migrations;

    /// A migrated in-memory pool.
    pub async fn pool() -> SqlitePool {
        let db = DatabasePool::in_memory().await.expect("in-memory pool");
        run_migrations(db.pool()).await.expect("migrations");
        db.into_pool()
    }

    /// Insert a bare user row and return its id.
    pub async fn user(pool: &SqlitePool, username: &str) -> UserId {
        sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users \
             (username, email, password_hash, display_name, current_reset_key, created_at) \
             VALUES (?, ?, 'hash', ?, ?, ?) RETURNING id",
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(username)
        .bind(format!("key-{username}"))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .expect("insert user")
    }
}
