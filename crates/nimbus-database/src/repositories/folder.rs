//! Folder repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_core::types::{FolderId, UserId};
use nimbus_entity::folder::{CreateFolder, Folder};

/// Rows removed by a subtree purge.
#[derive(Debug, Clone, Default)]
pub struct PurgedSubtree {
    /// Folder ids that were deleted, the requested root included.
    pub folder_ids: Vec<FolderId>,
    /// Blob keys of every deleted file, for best-effort blob cleanup.
    pub blob_paths: Vec<String>,
}

/// Repository for folder CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: SqlitePool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID within the owner's folders, trashed or not.
    pub async fn find_by_id(&self, id: FolderId, owner: UserId) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Find an active folder that can receive new content.
    pub async fn find_active(&self, id: FolderId, owner: UserId) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE id = ? AND user_id = ? AND is_deleted = 0",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))?
        .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// List active direct children of `parent`, or active root folders.
    pub async fn list_children(
        &self,
        owner: UserId,
        parent: Option<FolderId>,
    ) -> AppResult<Vec<Folder>> {
        let query = match parent {
            Some(parent_id) => sqlx::query_as::<_, Folder>(
                "SELECT * FROM folders WHERE user_id = ? AND parent_id = ? AND is_deleted = 0 \
                 ORDER BY name COLLATE NOCASE ASC",
            )
            .bind(owner)
            .bind(parent_id),
            None => sqlx::query_as::<_, Folder>(
                "SELECT * FROM folders WHERE user_id = ? AND parent_id IS NULL AND is_deleted = 0 \
                 ORDER BY name COLLATE NOCASE ASC",
            )
            .bind(owner),
        };

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// List every active folder of the owner as a flat list.
    pub async fn list_all(&self, owner: UserId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE user_id = ? AND is_deleted = 0 \
             ORDER BY name COLLATE NOCASE ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// List trashed folders, most recently created first.
    pub async fn list_trashed(&self, owner: UserId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE user_id = ? AND is_deleted = 1 ORDER BY id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list trashed folders", e)
        })
    }

    /// Create a new folder.
    pub async fn create(&self, owner: UserId, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (name, user_id, parent_id, created_at) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(&data.name)
        .bind(owner)
        .bind(data.parent_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    /// Rename a folder.
    pub async fn rename(&self, id: FolderId, owner: UserId, name: &str) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = ? WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(name)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename folder", e))?
        .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Set the trash flag.
    pub async fn set_deleted(
        &self,
        id: FolderId,
        owner: UserId,
        deleted: bool,
    ) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET is_deleted = ? WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(deleted)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder", e))?
        .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Delete a folder, all of its descendants, and every file inside them
    /// in one transaction. Returns what was removed.
    pub async fn purge_subtree(&self, id: FolderId, owner: UserId) -> AppResult<PurgedSubtree> {
        let db_err = |context: &'static str| {
            move |e: sqlx::Error| AppError::with_source(ErrorKind::Database, context, e)
        };

        let mut tx = self.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;

        let folder_ids: Vec<FolderId> = sqlx::query_scalar(
            "WITH RECURSIVE tree(id) AS ( \
                SELECT id FROM folders WHERE id = ? AND user_id = ? \
                UNION \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
                WHERE f.user_id = ? \
             ) SELECT id FROM tree",
        )
        .bind(id)
        .bind(owner)
        .bind(owner)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("Failed to collect folder subtree"))?;

        if folder_ids.is_empty() {
            return Err(AppError::not_found("Folder not found"));
        }

        let mut blob_paths = Vec::new();
        for folder_id in &folder_ids {
            let paths: Vec<String> = sqlx::query_scalar(
                "DELETE FROM files WHERE folder_id = ? AND user_id = ? RETURNING path",
            )
            .bind(*folder_id)
            .bind(owner)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to delete folder files"))?;
            blob_paths.extend(paths);
        }

        // Children before parents so the parent_id reference never dangles.
        for folder_id in folder_ids.iter().rev() {
            sqlx::query("DELETE FROM folders WHERE id = ? AND user_id = ?")
                .bind(*folder_id)
                .bind(owner)
                .execute(&mut *tx)
                .await
                .map_err(db_err("Failed to delete folder"))?;
        }

        tx.commit().await.map_err(db_err("Failed to commit folder purge"))?;

        Ok(PurgedSubtree {
            folder_ids,
            blob_paths,
        })
    }

    /// Count the owner's active folders.
    pub async fn count_active(&self, owner: UserId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE user_id = ? AND is_deleted = 0")
                .bind(owner)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count folders", e)
                })?;
        Ok(count as u64)
    }

    /// Whether any of the owner's folders has a parent.
    pub async fn has_nested(&self, owner: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM folders WHERE user_id = ? AND parent_id IS NOT NULL)",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to inspect folders", e))
    }
}
