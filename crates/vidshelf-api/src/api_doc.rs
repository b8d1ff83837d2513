//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vidshelf_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vidshelf API",
        version = "0.1.0",
        description = "Upload videos for optimization on the media service and list the recorded videos."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::videos::list_videos,
    ),
    components(schemas(
        models::VideoRecord,
        models::UploadVideoResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "videos", description = "Video upload and listing")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_both_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/api/video-upload"));
        assert!(spec.paths.paths.contains_key("/api/videos"));
    }
}
