//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use nimbus_database::connection::ping;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match ping(&state.db_pool).await {
        Ok(reachable) => reachable,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };
    let storage = match state.blobs.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(
                error = %e,
                provider = state.blobs.provider_type(),
                "Blob store health check failed"
            );
            false
        }
    };

    let label = |ok: bool| if ok { "connected" } else { "unavailable" }.to_string();
    let status = if database && storage {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: label(database),
            storage: label(storage),
        }),
    )
}
