//! File lifecycle: listing, creation, favorites, trash, moves, and purge.

use std::sync::Arc;

use tracing::{info, warn};

use nimbus_core::error::AppError;
use nimbus_core::traits::BlobStore;
use nimbus_core::types::{FileId, FolderId};
use nimbus_database::repositories::{FileQuery, FileRepository, FolderRepository, FolderScope};
use nimbus_entity::file::{CreateFile, File, FileCategory};

use crate::context::RequestContext;

/// The single authority for state transitions on files.
///
/// Files move between three states: active, trashed (`is_deleted`), and
/// purged (row removed). The favorite flag is independent of that axis.
/// Every lookup is scoped to the caller, so another user's file is
/// reported exactly like a missing one.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Folder repository (for target validation).
    folder_repo: Arc<FolderRepository>,
    /// Blob store holding file content.
    blobs: Arc<dyn BlobStore>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        folder_repo: Arc<FolderRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            file_repo,
            folder_repo,
            blobs,
        }
    }

    /// Active files directly inside `folder_id`, or at the root when `None`.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        folder_id: Option<FolderId>,
    ) -> Result<Vec<File>, AppError> {
        let query = FileQuery::active(ctx.user_id).in_folder(FolderScope::from(folder_id));
        self.file_repo.list(&query).await
    }

    /// Files of one category across all folders.
    pub async fn list_by_category(
        &self,
        ctx: &RequestContext,
        category: FileCategory,
    ) -> Result<Vec<File>, AppError> {
        match category {
            FileCategory::Favorites => self.list_favorites(ctx).await,
            FileCategory::Trash => self.list_trashed(ctx).await,
            typed => {
                let mut query = FileQuery::active(ctx.user_id);
                if let Some(filter) = typed.mime_filter() {
                    query = query.with_mime(filter);
                }
                self.file_repo.list(&query).await
            }
        }
    }

    /// Starred files that are not in the trash.
    pub async fn list_favorites(&self, ctx: &RequestContext) -> Result<Vec<File>, AppError> {
        self.file_repo
            .list(&FileQuery::active(ctx.user_id).favorites())
            .await
    }

    /// Files in the trash.
    pub async fn list_trashed(&self, ctx: &RequestContext) -> Result<Vec<File>, AppError> {
        self.file_repo.list(&FileQuery::trashed(ctx.user_id)).await
    }

    /// Gets a single file, trashed or not.
    pub async fn get_file(&self, ctx: &RequestContext, file_id: FileId) -> Result<File, AppError> {
        self.file_repo.find_by_id(file_id, ctx.user_id).await
    }

    /// Records a new file. A target folder must be one of the caller's
    /// active folders; there is no fallback to the root.
    pub async fn create_file(
        &self,
        ctx: &RequestContext,
        data: &CreateFile,
    ) -> Result<File, AppError> {
        if let Some(folder_id) = data.folder_id {
            self.folder_repo.find_active(folder_id, ctx.user_id).await?;
        }

        let file = self.file_repo.create(ctx.user_id, data).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file.id,
            original_name = %file.original_name,
            size = file.size,
            "File created"
        );

        Ok(file)
    }

    /// Flips the favorite flag atomically and returns the updated file.
    pub async fn toggle_favorite(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> Result<File, AppError> {
        let file = self.file_repo.toggle_favorite(file_id, ctx.user_id).await?;
        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            is_favorite = file.is_favorite,
            "File favorite toggled"
        );
        Ok(file)
    }

    /// Moves a file to the trash.
    pub async fn soft_delete(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> Result<File, AppError> {
        let file = self.file_repo.set_deleted(file_id, ctx.user_id, true).await?;
        info!(user_id = %ctx.user_id, file_id = %file_id, "File moved to trash");
        Ok(file)
    }

    /// Brings a file back from the trash.
    pub async fn restore(&self, ctx: &RequestContext, file_id: FileId) -> Result<File, AppError> {
        let file = self.file_repo.set_deleted(file_id, ctx.user_id, false).await?;
        info!(user_id = %ctx.user_id, file_id = %file_id, "File restored");
        Ok(file)
    }

    /// Removes a file for good, from either the active or trashed state.
    ///
    /// The row goes first. A blob that then fails to delete is left behind
    /// and logged; a row pointing at missing content would be worse.
    pub async fn permanent_delete(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> Result<File, AppError> {
        let file = self.file_repo.delete(file_id, ctx.user_id).await?;
        self.remove_blob(&file.path).await;
        info!(user_id = %ctx.user_id, file_id = %file_id, "File permanently deleted");
        Ok(file)
    }

    /// Moves a file into `target`, or to the root when `None`.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        target: Option<FolderId>,
    ) -> Result<File, AppError> {
        self.file_repo.find_by_id(file_id, ctx.user_id).await?;
        if let Some(folder_id) = target {
            self.folder_repo.find_active(folder_id, ctx.user_id).await?;
        }

        let file = self.file_repo.move_to(file_id, ctx.user_id, target).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            folder_id = ?target,
            "File moved"
        );

        Ok(file)
    }

    /// Best-effort blob removal after its row is gone.
    pub(crate) async fn remove_blob(&self, key: &str) {
        if let Err(e) = self.blobs.delete(key).await {
            warn!(key, error = %e, "Failed to delete blob, leaving it orphaned");
        }
    }
}

#[cfg(test)]
mod tests {
    use nimbus_core::error::ErrorKind;

    use super::*;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn test_other_users_files_are_not_found() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let bob = h.user("bob").await;
        let file = h.upload(&alice, "a.txt", b"hello", None).await;

        let attempts = [
            h.files.get_file(&bob, file.id).await,
            h.files.toggle_favorite(&bob, file.id).await,
            h.files.soft_delete(&bob, file.id).await,
            h.files.restore(&bob, file.id).await,
            h.files.move_file(&bob, file.id, None).await,
            h.files.permanent_delete(&bob, file.id).await,
        ];
        for result in attempts {
            let err = result.unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
            assert_eq!(err.message, "File not found");
        }

        // Same signal as a file that never existed.
        let missing = h.files.get_file(&bob, FileId(9_999)).await.unwrap_err();
        assert_eq!(missing.message, "File not found");
        assert_eq!(h.files.get_file(&alice, file.id).await.unwrap(), file);
    }

    #[tokio::test]
    async fn test_soft_delete_then_restore_is_identity() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let file = h.upload(&alice, "a.txt", b"hello", None).await;

        h.files.soft_delete(&alice, file.id).await.unwrap();
        assert!(h.files.list_files(&alice, None).await.unwrap().is_empty());
        assert_eq!(h.files.list_trashed(&alice).await.unwrap().len(), 1);

        let restored = h.files.restore(&alice, file.id).await.unwrap();
        assert_eq!(restored, file);
        assert_eq!(h.files.list_files(&alice, None).await.unwrap(), vec![file]);
        assert!(h.files.list_trashed(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trashed_favorite_is_hidden_from_favorites() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let file = h.upload(&alice, "a.txt", b"x", None).await;

        assert!(h.files.toggle_favorite(&alice, file.id).await.unwrap().is_favorite);
        h.files.soft_delete(&alice, file.id).await.unwrap();
        assert!(h.files.list_favorites(&alice).await.unwrap().is_empty());

        // Toggling in the trash is allowed.
        let toggled = h.files.toggle_favorite(&alice, file.id).await.unwrap();
        assert!(!toggled.is_favorite);
        assert!(toggled.is_deleted);
    }

    #[tokio::test]
    async fn test_move_to_root_and_back() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let folder = h.folders.create_folder(&alice, "Photos", None).await.unwrap();
        let file = h.upload(&alice, "a.png", b"png", Some(folder.id)).await;

        let moved = h.files.move_file(&alice, file.id, None).await.unwrap();
        assert_eq!(moved.folder_id, None);
        assert_eq!(h.files.list_files(&alice, None).await.unwrap(), vec![moved]);
        assert!(h.files.list_files(&alice, Some(folder.id)).await.unwrap().is_empty());

        let back = h.files.move_file(&alice, file.id, Some(folder.id)).await.unwrap();
        assert_eq!(back.folder_id, Some(folder.id));
    }

    #[tokio::test]
    async fn test_move_into_foreign_or_trashed_folder_fails() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let bob = h.user("bob").await;
        let bobs = h.folders.create_folder(&bob, "Bob", None).await.unwrap();
        let trashed = h.folders.create_folder(&alice, "Old", None).await.unwrap();
        h.folders.soft_delete(&alice, trashed.id).await.unwrap();
        let file = h.upload(&alice, "a.txt", b"x", None).await;

        for target in [bobs.id, trashed.id] {
            let err = h.files.move_file(&alice, file.id, Some(target)).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
            assert_eq!(err.message, "Folder not found");
        }
        assert_eq!(h.files.get_file(&alice, file.id).await.unwrap().folder_id, None);
    }

    #[tokio::test]
    async fn test_permanent_delete_from_active_removes_row_and_blob() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let file = h.upload(&alice, "a.txt", b"bytes", None).await;
        assert!(h.blobs.exists(&file.path).await.unwrap());

        h.files.permanent_delete(&alice, file.id).await.unwrap();

        assert!(!h.blobs.exists(&file.path).await.unwrap());
        let err = h.files.get_file(&alice, file.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(h.files.list_trashed(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_delete_tolerates_missing_blob() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let file = h.upload(&alice, "a.txt", b"bytes", None).await;
        h.blobs.delete(&file.path).await.unwrap();

        h.files.permanent_delete(&alice, file.id).await.unwrap();
        assert!(h.files.get_file(&alice, file.id).await.is_err());
    }

    #[tokio::test]
    async fn test_category_listing() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let pdf = h.upload(&alice, "paper.pdf", b"%PDF", None).await;
        let png = h.upload(&alice, "cat.png", b"png", None).await;
        let doc = h.upload(&alice, "notes.txt", b"notes", None).await;

        let ids = |files: Vec<File>| files.into_iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(
            ids(h.files.list_by_category(&alice, FileCategory::Pdfs).await.unwrap()),
            vec![pdf.id]
        );
        assert_eq!(
            ids(h.files.list_by_category(&alice, FileCategory::Images).await.unwrap()),
            vec![png.id]
        );
        assert_eq!(
            ids(h.files.list_by_category(&alice, FileCategory::Documents).await.unwrap()),
            vec![doc.id]
        );
        assert!(h.files.list_by_category(&alice, FileCategory::Videos).await.unwrap().is_empty());
    }
}
