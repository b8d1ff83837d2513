//! Media service abstraction trait

use crate::error::MediaResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

/// A video file as received from the client.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub data: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl VideoUpload {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What the service reports back once an asset has been processed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    /// Size of the stored asset after processing.
    pub bytes: u64,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Per-upload processing options.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    /// Logical folder the asset is grouped under.
    pub folder: String,
    pub resource_type: String,
    /// Transformation components applied on ingest, in order.
    pub transformations: Vec<String>,
}

impl UploadOptions {
    /// Video upload into `folder` with automatic quality and automatic format.
    pub fn auto_optimized_video(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            resource_type: "video".to_string(),
            transformations: vec!["q_auto".to_string(), "f_auto".to_string()],
        }
    }

    /// Chained transformation string, e.g. `q_auto/f_auto`.
    pub fn transformation(&self) -> String {
        self.transformations.join("/")
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::auto_optimized_video("video-uploads")
    }
}

/// Remote media processing service.
///
/// Implementations upload the binary, wait for the service to accept it and
/// return its asset descriptor. Nothing is retried.
#[async_trait]
pub trait MediaService: Send + Sync {
    async fn upload_video(&self, upload: VideoUpload) -> MediaResult<UploadedAsset>;
}
