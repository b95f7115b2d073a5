//! File repository implementation.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use nimbus_core::error::{AppError, ErrorKind};
use nimbus_core::result::AppResult;
use nimbus_core::types::{FileId, FolderId, UserId};
use nimbus_entity::file::{CreateFile, File, MimeFilter};

/// Which folder a listing is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderScope {
    /// Files with no folder.
    Root,
    /// Files directly inside this folder.
    Folder(FolderId),
}

impl From<Option<FolderId>> for FolderScope {
    fn from(folder: Option<FolderId>) -> Self {
        folder.map_or(Self::Root, Self::Folder)
    }
}

/// Parameters of the single file-listing primitive. Every public listing
/// is expressed as one of these.
#[derive(Debug, Clone, Copy)]
pub struct FileQuery {
    /// Owner whose files are listed.
    pub owner: UserId,
    /// `true` lists the trash, `false` lists active files.
    pub trashed: bool,
    /// Optional folder restriction.
    pub folder: Option<FolderScope>,
    /// Optional MIME restriction.
    pub mime: Option<MimeFilter>,
    /// Only starred files.
    pub favorites_only: bool,
}

impl FileQuery {
    /// Active files of `owner`, unrestricted.
    pub fn active(owner: UserId) -> Self {
        Self {
            owner,
            trashed: false,
            folder: None,
            mime: None,
            favorites_only: false,
        }
    }

    /// Trashed files of `owner`.
    pub fn trashed(owner: UserId) -> Self {
        Self {
            trashed: true,
            ..Self::active(owner)
        }
    }

    /// Restrict to a folder scope.
    pub fn in_folder(mut self, scope: FolderScope) -> Self {
        self.folder = Some(scope);
        self
    }

    /// Restrict to a MIME filter.
    pub fn with_mime(mut self, filter: MimeFilter) -> Self {
        self.mime = Some(filter);
        self
    }

    /// Restrict to starred files.
    pub fn favorites(mut self) -> Self {
        self.favorites_only = true;
        self
    }

    fn push_conditions<'a>(&self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(" WHERE user_id = ");
        qb.push_bind(self.owner);
        qb.push(" AND is_deleted = ");
        qb.push_bind(self.trashed);

        match self.folder {
            Some(FolderScope::Root) => {
                qb.push(" AND folder_id IS NULL");
            }
            Some(FolderScope::Folder(id)) => {
                qb.push(" AND folder_id = ");
                qb.push_bind(id);
            }
            None => {}
        }

        if self.favorites_only {
            qb.push(" AND is_favorite = 1");
        }

        match self.mime {
            Some(MimeFilter::Exact(mime)) => {
                qb.push(" AND mime_type = ");
                qb.push_bind(mime);
            }
            Some(MimeFilter::Prefixes(prefixes)) => {
                qb.push(" AND (");
                for (i, prefix) in prefixes.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push("substr(mime_type, 1, ");
                    qb.push_bind(prefix.len() as i64);
                    qb.push(") = ");
                    qb.push_bind(*prefix);
                }
                qb.push(")");
            }
            None => {}
        }
    }
}

/// Repository for file metadata.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a file by ID within the owner's files, trashed or not.
    pub async fn find_by_id(&self, id: FileId, owner: UserId) -> AppResult<File> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// List files matching a query, newest first.
    pub async fn list(&self, query: &FileQuery) -> AppResult<Vec<File>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM files");
        query.push_conditions(&mut qb);
        qb.push(" ORDER BY id DESC");

        qb.build_query_as::<File>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Count files matching a query.
    pub async fn count(&self, query: &FileQuery) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM files");
        query.push_conditions(&mut qb);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;
        Ok(count as u64)
    }

    /// Insert a new file record owned by `owner`.
    pub async fn create(&self, owner: UserId, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files \
             (name, original_name, mime_type, size, path, user_id, folder_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.original_name)
        .bind(&data.mime_type)
        .bind(data.size)
        .bind(&data.path)
        .bind(owner)
        .bind(data.folder_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            crate::map_unique_violation(
                e,
                |_| Some(format!("Blob path '{}' is already in use", data.path)),
                "Failed to create file",
            )
        })
    }

    /// Flip the favorite flag in a single statement.
    ///
    /// Two concurrent toggles each invert the value they observe, so a pair
    /// of them always cancels out.
    pub async fn toggle_favorite(&self, id: FileId, owner: UserId) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET is_favorite = NOT is_favorite \
             WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to toggle favorite", e))?
        .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Set the trash flag.
    pub async fn set_deleted(&self, id: FileId, owner: UserId, deleted: bool) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET is_deleted = ? WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(deleted)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?
        .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Point a file at a new folder, `None` meaning the root.
    pub async fn move_to(
        &self,
        id: FileId,
        owner: UserId,
        folder_id: Option<FolderId>,
    ) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET folder_id = ? WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(folder_id)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move file", e))?
        .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Remove the row and return it so the caller can delete the blob.
    pub async fn delete(&self, id: FileId, owner: UserId) -> AppResult<File> {
        sqlx::query_as::<_, File>("DELETE FROM files WHERE id = ? AND user_id = ? RETURNING *")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}

#[cfg(test)]
mod tests {
    use nimbus_entity::file::FileCategory;

    use super::*;
    use crate::repositories::test_support;

    fn descriptor(name: &str, mime: &str, folder_id: Option<FolderId>) -> CreateFile {
        CreateFile {
            name: format!("stored-{name}"),
            original_name: name.to_string(),
            mime_type: mime.to_string(),
            size: 100,
            path: format!("blob/{name}"),
            folder_id,
        }
    }

    #[tokio::test]
    async fn test_lookup_is_owner_scoped() {
        let pool = test_support::pool().await;
        let alice = test_support::user(&pool, "alice").await;
        let bob = test_support::user(&pool, "bob").await;
        let repo = FileRepository::new(pool);

        let file = repo.create(alice, &descriptor("a.txt", "text/plain", None)).await.unwrap();

        assert!(repo.find_by_id(file.id, alice).await.is_ok());
        let err = repo.find_by_id(file.id, bob).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = repo.toggle_favorite(file.id, bob).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores_value() {
        let pool = test_support::pool().await;
        let alice = test_support::user(&pool, "alice").await;
        let repo = FileRepository::new(pool);
        let file = repo.create(alice, &descriptor("a.png", "image/png", None)).await.unwrap();

        assert!(repo.toggle_favorite(file.id, alice).await.unwrap().is_favorite);
        assert!(!repo.toggle_favorite(file.id, alice).await.unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_cancel_out() {
        let pool = test_support::pool().await;
        let alice = test_support::user(&pool, "alice").await;
        let repo = FileRepository::new(pool);
        let file = repo.create(alice, &descriptor("a.png", "image/png", None)).await.unwrap();

        let (a, b) = tokio::join!(
            repo.toggle_favorite(file.id, alice),
            repo.toggle_favorite(file.id, alice)
        );
        assert_ne!(a.unwrap().is_favorite, b.unwrap().is_favorite);
        assert!(!repo.find_by_id(file.id, alice).await.unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_listing_primitive_filters() {
        let pool = test_support::pool().await;
        let alice = test_support::user(&pool, "alice").await;
        let repo = FileRepository::new(pool);

        let png = repo.create(alice, &descriptor("a.png", "image/png", None)).await.unwrap();
        let pdf = repo.create(alice, &descriptor("b.pdf", "application/pdf", None)).await.unwrap();
        let docx = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
        let doc = repo.create(alice, &descriptor("c.docx", docx, None)).await.unwrap();
        repo.set_deleted(png.id, alice, true).await.unwrap();

        let ids = |files: Vec<File>| files.into_iter().map(|f| f.id).collect::<Vec<_>>();

        let active = repo
            .list(&FileQuery::active(alice).in_folder(FolderScope::Root))
            .await
            .unwrap();
        assert_eq!(ids(active), vec![doc.id, pdf.id]);

        let trash = repo.list(&FileQuery::trashed(alice)).await.unwrap();
        assert_eq!(ids(trash), vec![png.id]);

        let pdfs = FileCategory::Pdfs.mime_filter().unwrap();
        let listed = repo.list(&FileQuery::active(alice).with_mime(pdfs)).await.unwrap();
        assert_eq!(ids(listed), vec![pdf.id]);

        let docs = FileCategory::Documents.mime_filter().unwrap();
        let listed = repo.list(&FileQuery::active(alice).with_mime(docs)).await.unwrap();
        assert_eq!(ids(listed), vec![doc.id]);
        assert_eq!(repo.count(&FileQuery::active(alice)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_returns_row_once() {
        let pool = test_support::pool().await;
        let alice = test_support::user(&pool, "alice").await;
        let repo = FileRepository::new(pool);
        let file = repo.create(alice, &descriptor("a.txt", "text/plain", None)).await.unwrap();

        assert_eq!(repo.delete(file.id, alice).await.unwrap().path, "blob/a.txt");
        assert_eq!(repo.delete(file.id, alice).await.unwrap_err().kind, ErrorKind::NotFound);
    }
}
