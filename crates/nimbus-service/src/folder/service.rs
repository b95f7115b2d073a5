//! Folder CRUD, trash, and subtree purge.

use std::sync::Arc;

use tracing::{info, warn};

use nimbus_core::error::AppError;
use nimbus_core::traits::BlobStore;
use nimbus_core::types::FolderId;
use nimbus_database::repositories::FolderRepository;
use nimbus_entity::folder::{CreateFolder, Folder};

use crate::context::RequestContext;

/// Longest accepted folder name, in characters.
const MAX_NAME_LEN: usize = 255;

/// Manages folder CRUD operations.
///
/// Folders are only ever parented at creation, and only under an active
/// folder of the same owner, so the tree can never contain a cycle.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// Blob store, for purging file content under a deleted subtree.
    blobs: Arc<dyn BlobStore>,
}

/// Outcome of a permanent folder delete.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeSummary {
    /// Folders removed, the requested one included.
    pub folders_deleted: usize,
    /// Files removed from inside them.
    pub files_deleted: usize,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(folder_repo: Arc<FolderRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { folder_repo, blobs }
    }

    /// Active direct children of `parent_id`, or active root folders.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FolderId>,
    ) -> Result<Vec<Folder>, AppError> {
        self.folder_repo.list_children(ctx.user_id, parent_id).await
    }

    /// Every active folder as a flat list, for move-target pickers.
    pub async fn list_all(&self, ctx: &RequestContext) -> Result<Vec<Folder>, AppError> {
        self.folder_repo.list_all(ctx.user_id).await
    }

    /// Folders in the trash.
    pub async fn list_trashed(&self, ctx: &RequestContext) -> Result<Vec<Folder>, AppError> {
        self.folder_repo.list_trashed(ctx.user_id).await
    }

    /// Gets a folder by ID, trashed or not.
    pub async fn get_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> Result<Folder, AppError> {
        self.folder_repo.find_by_id(folder_id, ctx.user_id).await
    }

    /// Creates a folder at the root or under one of the caller's active
    /// folders.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> Result<Folder, AppError> {
        let name = validate_name(name)?;
        if let Some(parent_id) = parent_id {
            self.folder_repo.find_active(parent_id, ctx.user_id).await?;
        }

        let folder = self
            .folder_repo
            .create(ctx.user_id, &CreateFolder { name, parent_id })
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            parent_id = ?parent_id,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames a folder. The name is trimmed and must not end up empty.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> Result<Folder, AppError> {
        let name = validate_name(new_name)?;
        let folder = self.folder_repo.rename(folder_id, ctx.user_id, &name).await?;
        info!(user_id = %ctx.user_id, folder_id = %folder_id, "Folder renamed");
        Ok(folder)
    }

    /// Moves a folder to the trash. Its contents keep their own flags.
    pub async fn soft_delete(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> Result<Folder, AppError> {
        let folder = self.folder_repo.set_deleted(folder_id, ctx.user_id, true).await?;
        info!(user_id = %ctx.user_id, folder_id = %folder_id, "Folder moved to trash");
        Ok(folder)
    }

    /// Brings a folder back from the trash.
    pub async fn restore(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> Result<Folder, AppError> {
        let folder = self.folder_repo.set_deleted(folder_id, ctx.user_id, false).await?;
        info!(user_id = %ctx.user_id, folder_id = %folder_id, "Folder restored");
        Ok(folder)
    }

    /// Deletes a folder, its descendants, and every file inside them.
    ///
    /// Rows are removed in one transaction; blobs are removed afterwards on
    /// a best-effort basis.
    pub async fn permanent_delete(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> Result<PurgeSummary, AppError> {
        let purged = self.folder_repo.purge_subtree(folder_id, ctx.user_id).await?;

        for key in &purged.blob_paths {
            if let Err(e) = self.blobs.delete(key).await {
                warn!(key = %key, error = %e, "Failed to delete blob, leaving it orphaned");
            }
        }

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder_id,
            folders = purged.folder_ids.len(),
            files = purged.blob_paths.len(),
            "Folder permanently deleted"
        );

        Ok(PurgeSummary {
            folders_deleted: purged.folder_ids.len(),
            files_deleted: purged.blob_paths.len(),
        })
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Folder name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Folder name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
