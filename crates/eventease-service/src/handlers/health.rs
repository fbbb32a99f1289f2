//! Health check handler.
//!
//! `/health` reports the active storage backend and whether the service fell
//! back to the transient store at startup. Returns 503 only when the active
//! store does not answer a ping.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

#[tracing::instrument(skip_all, name = "ee.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let storage = state.store.backend().as_str().to_string();

    let (code, status) = match state.store.ping().await {
        Err(e) => {
            // Generic status to the client; the cause stays in the logs.
            tracing::warn!(target: "ee.health", error = %e, "Storage ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
        Ok(()) if state.degraded => (StatusCode::OK, "degraded"),
        Ok(()) => (StatusCode::OK, "healthy"),
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            storage,
            degraded: state.degraded,
            timestamp: chrono::Utc::now(),
        }),
    )
}
