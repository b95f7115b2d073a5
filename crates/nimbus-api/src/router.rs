//! Route definitions for the Nimbus Drive HTTP API.
//!
//! All routes are mounted under `/api`. Every route except registration,
//! login, password reset, and health requires a bearer token, enforced by
//! the `AuthUser` extractor in each handler.

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Builds the `/api` router without outer middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(profile_routes())
        .merge(file_routes())
        .merge(folder_routes())
        .merge(achievement_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Registration, login, current user, and reset keys
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/user", get(handlers::auth::current_user))
        .route(
            "/download-reset-key",
            get(handlers::auth::download_reset_key),
        )
        .route("/reset-password", post(handlers::auth::reset_password))
}

/// Profile and profile picture
fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route(
            "/profile/picture",
            get(handlers::profile::get_picture).post(handlers::profile::upload_picture),
        )
}

/// File listing, lifecycle, upload, and delivery
fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/files",
            get(handlers::file::list_files).post(handlers::file::upload_file),
        )
        .route("/files/favorites", get(handlers::file::list_favorites))
        .route("/files/deleted", get(handlers::file::list_deleted))
        .route(
            "/files/{id}",
            get(handlers::file::get_file).delete(handlers::file::delete_file),
        )
        .route("/files/{id}/preview", get(handlers::file::preview_file))
        .route("/files/{id}/download", get(handlers::file::download_file))
        .route("/files/{id}/favorite", post(handlers::file::toggle_favorite))
        .route("/files/{id}/restore", post(handlers::file::restore_file))
        .route(
            "/files/{id}/permanent",
            delete(handlers::file::permanent_delete_file),
        )
        .route("/files/{id}/move", put(handlers::file::move_file))
}

/// Folder CRUD and trash
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/folders",
            get(handlers::folder::list_folders).post(handlers::folder::create_folder),
        )
        .route("/folders/all", get(handlers::folder::list_all_folders))
        .route("/folders/deleted", get(handlers::folder::list_deleted_folders))
        .route(
            "/folders/{id}",
            get(handlers::folder::get_folder)
                .put(handlers::folder::rename_folder)
                .delete(handlers::folder::delete_folder),
        )
        .route("/folders/{id}/restore", post(handlers::folder::restore_folder))
        .route(
            "/folders/{id}/permanent",
            delete(handlers::folder::permanent_delete_folder),
        )
}

/// Achievement catalog and unlocks
fn achievement_routes() -> Router<AppState> {
    Router::new()
        .route("/achievements", get(handlers::achievement::achievements))
        .route(
            "/user-achievements",
            get(handlers::achievement::user_achievements),
        )
}

/// Unauthenticated liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
