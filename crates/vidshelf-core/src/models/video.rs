use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored metadata for a video that the media service has already processed.
///
/// Rows are written once by the upload handler and never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Asset identifier assigned by the media service.
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    /// Playback length in seconds.
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied text fields of an upload form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoUploadFields {
    pub title: String,
    pub description: Option<String>,
    pub original_size: String,
}

/// Insert payload for a new `VideoRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideoRecord {
    pub title: String,
    pub description: Option<String>,
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    pub duration: f64,
}

impl NewVideoRecord {
    /// Combine the form fields with what the media service reported after processing.
    ///
    /// A missing duration is stored as `0`.
    pub fn from_processed(
        fields: VideoUploadFields,
        public_id: impl Into<String>,
        processed_bytes: u64,
        duration: Option<f64>,
    ) -> Self {
        Self {
            title: fields.title,
            description: fields.description,
            public_id: public_id.into(),
            original_size: fields.original_size,
            compressed_size: processed_bytes.to_string(),
            duration: duration.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoResponse {
    pub public_id: String,
}
