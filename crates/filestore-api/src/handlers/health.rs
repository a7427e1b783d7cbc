//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /health
///
/// No authentication. Answers 503 when the database cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let users = state.user_store.clone();
    let database_up = match state.pool.run(async move { users.health_check().await }).await {
        Ok(up) => up,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    if database_up {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "connected".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                database: "unavailable".to_string(),
            }),
        )
    }
}
