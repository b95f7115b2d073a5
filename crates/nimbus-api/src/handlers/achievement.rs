//! Achievement handlers.

use axum::Json;
use axum::extract::State;

use nimbus_entity::achievement::UserAchievement;
use nimbus_service::achievement::AchievementOverview;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/achievements
///
/// Evaluates unlocks first, so `newUnlocked` carries anything earned since
/// the last call.
pub async fn achievements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<AchievementOverview>> {
    Ok(Json(state.achievement_service.overview(&auth).await?))
}

/// GET /api/user-achievements
pub async fn user_achievements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<UserAchievement>>> {
    Ok(Json(state.achievement_service.user_achievements(&auth).await?))
}
