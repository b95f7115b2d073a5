//! Folder CRUD and trash handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use nimbus_entity::folder::Folder;

use crate::dto::request::{CreateFolderRequest, ListFoldersQuery, RenameFolderRequest};
use crate::dto::response::{MessageResponse, PurgeResponse};
use crate::error::ApiResult;
use crate::extractors::path::{parse_folder_id, parse_optional_folder_id};
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/folders?parentId=
pub async fn list_folders(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListFoldersQuery>,
) -> ApiResult<Json<Vec<Folder>>> {
    let parent_id = parse_optional_folder_id(query.parent_id.as_deref())?;
    Ok(Json(state.folder_service.list_children(&auth, parent_id).await?))
}

/// GET /api/folders/all
pub async fn list_all_folders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Folder>>> {
    Ok(Json(state.folder_service.list_all(&auth).await?))
}

/// GET /api/folders/deleted
pub async fn list_deleted_folders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Folder>>> {
    Ok(Json(state.folder_service.list_trashed(&auth).await?))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<Folder>)> {
    let folder = state
        .folder_service
        .create_folder(&auth, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Folder>> {
    let folder_id = parse_folder_id(&id)?;
    Ok(Json(state.folder_service.get_folder(&auth, folder_id).await?))
}

/// PUT /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RenameFolderRequest>,
) -> ApiResult<Json<Folder>> {
    let folder_id = parse_folder_id(&id)?;
    let folder = state
        .folder_service
        .rename_folder(&auth, folder_id, &req.name)
        .await?;
    Ok(Json(folder))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let folder_id = parse_folder_id(&id)?;
    state.folder_service.soft_delete(&auth, folder_id).await?;
    Ok(Json(MessageResponse::new("Folder moved to trash")))
}

/// POST /api/folders/{id}/restore
pub async fn restore_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let folder_id = parse_folder_id(&id)?;
    state.folder_service.restore(&auth, folder_id).await?;
    Ok(Json(MessageResponse::new("Folder restored")))
}

/// DELETE /api/folders/{id}/permanent
pub async fn permanent_delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<PurgeResponse>> {
    let folder_id = parse_folder_id(&id)?;
    let summary = state.folder_service.permanent_delete(&auth, folder_id).await?;
    Ok(Json(summary.into()))
}
