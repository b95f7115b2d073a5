//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::SqlitePool;

use nimbus_auth::jwt::{JwtDecoder, JwtEncoder};
use nimbus_auth::password::{PasswordHasher, PasswordValidator};
use nimbus_core::config::AppConfig;
use nimbus_core::error::AppError;
use nimbus_core::traits::BlobStore;
use nimbus_database::repositories::{
    AchievementRepository, FileRepository, FolderRepository, UserRepository,
};
use nimbus_service::{
    AccountService, AchievementService, DeliveryService, FileService, FolderService, UploadService,
};
use nimbus_storage::LocalBlobStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// SQLite connection pool
    pub db_pool: SqlitePool,
    /// Blob store holding every user partition
    pub blobs: Arc<dyn BlobStore>,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// File lifecycle service
    pub file_service: Arc<FileService>,
    /// Multipart ingestion service
    pub upload_service: Arc<UploadService>,
    /// Preview and download service
    pub delivery_service: Arc<DeliveryService>,
    /// Folder service
    pub folder_service: Arc<FolderService>,
    /// Accounts, profile, and reset keys
    pub account_service: Arc<AccountService>,
    /// Achievement evaluation
    pub achievement_service: Arc<AchievementService>,
}

impl AppState {
    /// Wires repositories, auth primitives, and services over `db_pool`
    /// and the configured blob root.
    pub async fn build(config: AppConfig, db_pool: SqlitePool) -> Result<Self, AppError> {
        let blob_store = LocalBlobStore::new(&config.storage.root_path).await?;
        let blobs: Arc<dyn BlobStore> = Arc::new(blob_store);
        Ok(Self::with_blob_store(config, db_pool, blobs))
    }

    /// Same as [`AppState::build`] with an already constructed blob store.
    pub fn with_blob_store(
        config: AppConfig,
        db_pool: SqlitePool,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let user_repo = Arc::new(UserRepository::new(db_pool.clone()));
        let file_repo = Arc::new(FileRepository::new(db_pool.clone()));
        let folder_repo = Arc::new(FolderRepository::new(db_pool.clone()));
        let achievement_repo = Arc::new(AchievementRepository::new(db_pool.clone()));

        let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        let password_hasher = Arc::new(PasswordHasher::new());
        let password_validator = Arc::new(PasswordValidator::new(&config.auth));

        let file_service = FileService::new(
            Arc::clone(&file_repo),
            Arc::clone(&folder_repo),
            Arc::clone(&blobs),
        );
        let upload_service = UploadService::new(
            file_service.clone(),
            Arc::clone(&blobs),
            config.upload.clone(),
        );
        let delivery_service = DeliveryService::new(file_service.clone(), Arc::clone(&blobs));
        let folder_service = FolderService::new(Arc::clone(&folder_repo), Arc::clone(&blobs));
        let account_service = AccountService::new(
            user_repo,
            Arc::clone(&blobs),
            password_hasher,
            password_validator,
            jwt_encoder,
        );
        let achievement_service =
            AchievementService::new(achievement_repo, file_repo, folder_repo);

        Self {
            config: Arc::new(config),
            db_pool,
            blobs,
            jwt_decoder,
            file_service: Arc::new(file_service),
            upload_service: Arc::new(upload_service),
            delivery_service: Arc::new(delivery_service),
            folder_service: Arc::new(folder_service),
            account_service: Arc::new(account_service),
            achievement_service: Arc::new(achievement_service),
        }
    }
}
