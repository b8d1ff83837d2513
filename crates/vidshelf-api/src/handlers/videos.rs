use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;
use vidshelf_core::models::VideoRecord;

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "All videos, most recent first", body = Vec<VideoRecord>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoRecord>>, HttpAppError> {
    let videos = state.videos.list_newest_first().await?;
    tracing::debug!(count = videos.len(), "Listed videos");
    Ok(Json(videos))
}
