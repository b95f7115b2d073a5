//! Service wiring over an in-memory database and a temporary blob root.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream;
use sqlx::SqlitePool;
use tempfile::TempDir;

use nimbus_auth::jwt::JwtEncoder;
use nimbus_auth::password::{PasswordHasher, PasswordValidator};
use nimbus_core::config::{AuthConfig, UploadConfig};
use nimbus_core::traits::{BlobStore, UploadStream};
use nimbus_core::types::FolderId;
use nimbus_database::DatabasePool;
use nimbus_database::migration::run_migrations;
use nimbus_database::repositories::{
    AchievementRepository, FileRepository, FolderRepository, UserRepository,
};
use nimbus_entity::file::File;
use nimbus_entity::user::CreateUser;
use nimbus_storage::LocalBlobStore;

use crate::context::RequestContext;
use crate::{
    AccountService, AchievementService, DeliveryService, FileService, FolderService, UploadService,
};

pub struct Harness {
    _dir: TempDir,
    pub pool: SqlitePool,
    pub blobs: Arc<LocalBlobStore>,
    pub files: FileService,
    pub folders: FolderService,
    pub uploads: UploadService,
    pub delivery: DeliveryService,
    pub accounts: AccountService,
    pub achievements: AchievementService,
}

impl Harness {
    pub async fn new() -> Self {
        let db = DatabasePool::in_memory().await.expect("in-memory pool");
        run_migrations(db.pool()).await.expect("migrations");
        let pool = db.into_pool();

        let dir = tempfile::tempdir().expect("tempdir");
        let blobs = Arc::new(LocalBlobStore::new(dir.path()).await.expect("blob store"));
        let store: Arc<dyn BlobStore> = blobs.clone();

        let file_repo = Arc::new(FileRepository::new(pool.clone()));
        let folder_repo = Arc::new(FolderRepository::new(pool.clone()));
        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let achievement_repo = Arc::new(AchievementRepository::new(pool.clone()));

        let auth = AuthConfig::default();
        let files = FileService::new(file_repo.clone(), folder_repo.clone(), store.clone());

        Self {
            _dir: dir,
            folders: FolderService::new(folder_repo.clone(), store.clone()),
            uploads: UploadService::new(files.clone(), store.clone(), UploadConfig::default()),
            delivery: DeliveryService::new(files.clone(), store.clone()),
            accounts: AccountService::new(
                user_repo,
                store,
                Arc::new(PasswordHasher::new()),
                Arc::new(PasswordValidator::new(&auth)),
                Arc::new(JwtEncoder::new(&auth)),
            ),
            achievements: AchievementService::new(achievement_repo, file_repo, folder_repo),
            files,
            pool,
            blobs,
        }
    }

    /// Rebuild the upload service with a smaller size limit.
    pub fn set_max_file_size(&mut self, bytes: u64) {
        let config = UploadConfig {
            max_file_size_bytes: bytes,
            ..UploadConfig::default()
        };
        let store: Arc<dyn BlobStore> = self.blobs.clone();
        self.uploads = UploadService::new(self.files.clone(), store, config);
    }

    /// Insert a user without paying for password hashing.
    pub async fn user(&self, username: &str) -> RequestContext {
        let user = UserRepository::new(self.pool.clone())
            .create(&CreateUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "unused".to_string(),
                display_name: username.to_string(),
                reset_key: format!("reset-{username}"),
            })
            .await
            .expect("create user");
        RequestContext::new(user.id, username)
    }

    /// Run a complete upload of `content`.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        original_name: &str,
        content: &[u8],
        folder_id: Option<FolderId>,
    ) -> File {
        let body: UploadStream<'static> =
            Box::pin(stream::iter(vec![Ok(Bytes::copy_from_slice(content))]));
        let blob = self
            .uploads
            .store_upload(ctx, original_name, body)
            .await
            .expect("store upload");
        self.uploads
            .finalize(ctx, blob, original_name, None, folder_id)
            .await
            .expect("finalize upload")
    }

    /// Whether the user's blob partition holds no files.
    pub async fn partition_is_empty(&self, ctx: &RequestContext) -> bool {
        let partition = self.blobs.root().join(ctx.user_id.to_string());
        match tokio::fs::read_dir(&partition).await {
            Ok(mut entries) => entries.next_entry().await.expect("read dir").is_none(),
            Err(_) => true,
        }
    }
}
