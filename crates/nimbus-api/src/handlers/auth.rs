//! Account handlers: register, login, current user, and reset keys.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use nimbus_entity::user::User;

use crate::dto::request::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::dto::response::{AuthResponse, ResetPasswordResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let session = state.account_service.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let session = state
        .account_service
        .login(&req.username, &req.password)
        .await?;
    Ok(Json(session.into()))
}

/// GET /api/user
pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<User>> {
    Ok(Json(state.account_service.current_user(&auth).await?))
}

/// GET /api/download-reset-key
pub async fn download_reset_key(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let document = state.account_service.reset_key_document(&auth).await?;
    let disposition = format!(
        "attachment; filename=\"{}-reset-key.json\"",
        document.username
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)))
}

/// POST /api/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<ResetPasswordResponse>> {
    let new_reset_key = state
        .account_service
        .reset_password(&req.reset_key, &req.new_password)
        .await?;
    Ok(Json(ResetPasswordResponse {
        message: "Password reset successfully".to_string(),
        new_reset_key,
    }))
}
