//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(serde::Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub database: String,
    pub media_service: &'static str,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the metadata store answers within the timeout.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match tokio::time::timeout(READINESS_TIMEOUT, state.videos.health_check()).await
    {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Readiness check failed");
            "unhealthy".to_string()
        }
        Err(_) => "timeout".to_string(),
    };

    let ready = database == "healthy";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" },
            database,
            media_service: if state.media.is_some() {
                "configured"
            } else {
                "not_configured"
            },
        }),
    )
}
