//! Profile and profile picture handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::Response;

use nimbus_core::error::AppError;
use nimbus_entity::user::User;
use nimbus_service::file::StoredBlob;
use nimbus_service::file::upload::resolve_mime;

use crate::dto::request::UpdateProfileRequest;
use crate::dto::response::ProfilePictureResponse;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, ValidatedJson};
use crate::handlers::media::{field_stream, multipart_error, read_text_field};
use crate::state::AppState;

/// Where the stored picture is served from.
const PICTURE_URL: &str = "/api/profile/picture";

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(state.account_service.current_user(&auth).await?))
}

/// PUT /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .account_service
        .update_profile(&auth, req.into())
        .await?;
    Ok(Json(user))
}

/// POST /api/profile/picture: multipart `profilePicture`
pub async fn upload_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfilePictureResponse>> {
    let limits = state.upload_service.config();
    let mut stored: Option<(StoredBlob, String)> = None;
    let mut fields = 0usize;

    let outcome: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            fields += 1;
            if fields > limits.max_fields {
                return Err(AppError::validation("Too many fields"));
            }
            let name = field.name().unwrap_or_default().to_string();
            if name != "profilePicture" {
                read_text_field(field, limits.max_field_size_bytes).await?;
                continue;
            }
            if stored.is_some() {
                return Err(AppError::validation("Only one profile picture may be uploaded"));
            }
            let original_name = field.file_name().unwrap_or("avatar").to_string();
            let mime_type = resolve_mime(field.content_type(), &original_name);
            let blob = state
                .upload_service
                .store_avatar(&auth, &original_name, field_stream(field))
                .await?;
            stored = Some((blob, mime_type));
        }
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        if let Some((blob, _)) = stored.take() {
            state.upload_service.discard(&blob).await;
        }
        return Err(ApiError(e));
    }

    let (blob, mime_type) =
        stored.ok_or_else(|| AppError::validation("No profile picture uploaded"))?;
    let user = state
        .account_service
        .set_profile_picture(&auth, blob, &mime_type)
        .await?;

    Ok(Json(ProfilePictureResponse {
        profile_picture: PICTURE_URL.to_string(),
        user,
    }))
}

/// GET /api/profile/picture
pub async fn get_picture(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Response> {
    let picture = state.account_service.profile_picture(&auth).await?;
    Response::builder()
        .header(header::CONTENT_TYPE, picture.mime_type)
        .header(header::CONTENT_LENGTH, picture.len)
        .header(header::CACHE_CONTROL, "private, max-age=0")
        .body(Body::from_stream(picture.stream))
        .map_err(|e| ApiError(AppError::internal(format!("Response build failed: {e}"))))
}
