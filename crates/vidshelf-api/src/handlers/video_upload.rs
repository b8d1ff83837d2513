use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::sync::Arc;
use vidshelf_core::models::{NewVideoRecord, UploadVideoResponse, VideoUploadFields};
use vidshelf_core::AppError;
use vidshelf_media::VideoUpload;

/// Parts of the upload form after the body has been read.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<VideoUpload>,
    title: Option<String>,
    description: Option<String>,
    original_size: Option<String>,
}

impl UploadForm {
    /// Require the file and the mandatory text fields.
    fn into_parts(self) -> Result<(VideoUpload, VideoUploadFields), AppError> {
        let file = self
            .file
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::InvalidInput("No file found in the request".to_string()))?;
        let title = self
            .title
            .ok_or_else(|| AppError::InvalidInput("Missing required field: title".to_string()))?;
        let original_size = self.original_size.ok_or_else(|| {
            AppError::InvalidInput("Missing required field: originalSize".to_string())
        })?;

        Ok((
            file,
            VideoUploadFields {
                title,
                description: self.description,
                original_size,
            },
        ))
    }
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, HttpAppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.file = Some(VideoUpload {
                    data,
                    file_name,
                    content_type,
                });
            }
            "title" => form.title = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "originalSize" => form.original_size = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/video-upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video processed and recorded", body = UploadVideoResponse),
        (status = 400, description = "Missing file or malformed form", body = ErrorResponse),
        (status = 401, description = "No authenticated user", body = ErrorResponse),
        (status = 500, description = "Configuration, media service or storage error", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadVideoResponse>, HttpAppError> {
    let media = state.media.clone().ok_or_else(|| {
        AppError::Configuration("Media service credentials are not set".to_string())
    })?;

    let form = read_upload_form(multipart?).await?;
    let (upload, fields) = form.into_parts()?;

    tracing::info!(
        user_id = %auth.user_id,
        bytes = upload.len(),
        file_name = ?upload.file_name,
        "Uploading video"
    );

    let asset = media.upload_video(upload).await?;

    let new_video =
        NewVideoRecord::from_processed(fields, asset.public_id.clone(), asset.bytes, asset.duration);

    let video = match state.videos.create(new_video).await {
        Ok(video) => video,
        Err(e) => {
            // The processed asset stays on the media service; nothing reconciles it.
            tracing::warn!(
                public_id = %asset.public_id,
                "Media asset has no video record after store failure"
            );
            return Err(e.into());
        }
    };

    tracing::info!(
        video_id = %video.id,
        public_id = %video.public_id,
        compressed_size = %video.compressed_size,
        duration = video.duration,
        "Video uploaded"
    );

    Ok(Json(UploadVideoResponse {
        public_id: video.public_id,
    }))
}
