//! File listing, lifecycle, upload, preview, and download handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;

use nimbus_core::error::AppError;
use nimbus_core::types::FolderId;
use nimbus_entity::file::{File, FileCategory};
use nimbus_service::file::StoredBlob;

use crate::dto::request::{ListFilesQuery, MoveFileRequest};
use crate::dto::response::MessageResponse;
use crate::error::{ApiError, ApiResult};
use crate::extractors::path::{parse_file_id, parse_optional_folder_id};
use crate::extractors::{AuthUser, ValidatedJson};
use crate::handlers::media::{
    field_stream, media_response, multipart_error, read_text_field,
};
use crate::state::AppState;

/// GET /api/files?folderId=&category=
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> ApiResult<Json<Vec<File>>> {
    let files = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => {
            let category: FileCategory = category.parse().map_err(AppError::validation)?;
            state.file_service.list_by_category(&auth, category).await?
        }
        None => {
            let folder_id = parse_optional_folder_id(query.folder_id.as_deref())?;
            state.file_service.list_files(&auth, folder_id).await?
        }
    };
    Ok(Json(files))
}

/// GET /api/files/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<File>>> {
    Ok(Json(state.file_service.list_favorites(&auth).await?))
}

/// GET /api/files/deleted
pub async fn list_deleted(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<File>>> {
    Ok(Json(state.file_service.list_trashed(&auth).await?))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<File>> {
    let file_id = parse_file_id(&id)?;
    Ok(Json(state.file_service.get_file(&auth, file_id).await?))
}

/// POST /api/files/{id}/favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let file_id = parse_file_id(&id)?;
    state.file_service.toggle_favorite(&auth, file_id).await?;
    Ok(Json(MessageResponse::new("File favorite status toggled")))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let file_id = parse_file_id(&id)?;
    state.file_service.soft_delete(&auth, file_id).await?;
    Ok(Json(MessageResponse::new("File moved to trash")))
}

/// POST /api/files/{id}/restore
pub async fn restore_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let file_id = parse_file_id(&id)?;
    state.file_service.restore(&auth, file_id).await?;
    Ok(Json(MessageResponse::new("File restored")))
}

/// DELETE /api/files/{id}/permanent
pub async fn permanent_delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let file_id = parse_file_id(&id)?;
    state.file_service.permanent_delete(&auth, file_id).await?;
    Ok(Json(MessageResponse::new("File permanently deleted")))
}

/// PUT /api/files/{id}/move
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<MoveFileRequest>,
) -> ApiResult<Json<File>> {
    let file_id = parse_file_id(&id)?;
    let file = state
        .file_service
        .move_file(&auth, file_id, req.folder_id)
        .await?;
    Ok(Json(file))
}

/// GET /api/files/{id}/preview
pub async fn preview_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let file_id = parse_file_id(&id)?;
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    let media = state.delivery_service.preview(&auth, file_id, range).await?;
    Ok(media_response(media)?)
}

/// GET /api/files/{id}/download
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let file_id = parse_file_id(&id)?;
    let media = state.delivery_service.download(&auth, file_id).await?;
    Ok(media_response(media)?)
}

/// Accepted pieces of an upload request.
#[derive(Debug, Default)]
struct UploadParts {
    folder_id: Option<FolderId>,
    stored: Option<(StoredBlob, String, Option<String>)>,
}

/// POST /api/files: multipart `file` plus optional `folderId`
///
/// The file streams straight into the blob store, so `folderId` may come
/// before or after it.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<File>)> {
    let mut parts = UploadParts::default();

    if let Err(e) = read_upload(&state, &auth, multipart, &mut parts).await {
        if let Some((blob, _, _)) = parts.stored.take() {
            state.upload_service.discard(&blob).await;
        }
        return Err(ApiError(e));
    }

    let (blob, original_name, mime_type) = parts
        .stored
        .ok_or_else(|| AppError::validation("No file uploaded"))?;

    let file = state
        .upload_service
        .finalize(&auth, blob, &original_name, mime_type.as_deref(), parts.folder_id)
        .await?;

    Ok((StatusCode::CREATED, Json(file)))
}

async fn read_upload(
    state: &AppState,
    auth: &AuthUser,
    mut multipart: Multipart,
    parts: &mut UploadParts,
) -> Result<(), AppError> {
    let limits = state.upload_service.config();
    let mut fields = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        fields += 1;
        if fields > limits.max_fields {
            return Err(AppError::validation(format!(
                "Too many fields; at most {} are allowed",
                limits.max_fields
            )));
        }

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if parts.stored.is_some() {
                    return Err(AppError::validation("Only one file may be uploaded per request"));
                }
                let original_name = field.file_name().unwrap_or("untitled").to_string();
                let mime_type = field.content_type().map(String::from);
                let blob = state
                    .upload_service
                    .store_upload(auth, &original_name, field_stream(field))
                    .await?;
                parts.stored = Some((blob, original_name, mime_type));
            }
            "folderId" => {
                let raw = read_text_field(field, limits.max_field_size_bytes).await?;
                parts.folder_id = parse_optional_folder_id(Some(&raw))?;
            }
            _ => {
                read_text_field(field, limits.max_field_size_bytes).await?;
            }
        }
    }

    Ok(())
}
