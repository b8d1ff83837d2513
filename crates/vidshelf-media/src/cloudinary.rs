//! Cloudinary upload API client
//!
//! Uploads are signed requests against `/{cloud_name}/{resource_type}/upload`.
//! See https://cloudinary.com/documentation/upload_images#generating_authentication_signatures

use crate::error::{MediaError, MediaResult};
use crate::traits::{MediaService, UploadOptions, UploadedAsset, VideoUpload};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use vidshelf_core::CloudinaryCredentials;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

/// Compute the request signature: SHA-1 over `k=v` pairs sorted by key and
/// joined with `&`, followed directly by the API secret.
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// `MediaService` backed by the Cloudinary upload API.
pub struct CloudinaryClient {
    http_client: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: String,
    options: UploadOptions,
}

impl Debug for CloudinaryClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryClient")
            .field("cloud_name", &self.credentials.cloud_name)
            .field("api_base", &self.api_base)
            .field("options", &self.options)
            .finish()
    }
}

impl CloudinaryClient {
    pub fn new(
        credentials: CloudinaryCredentials,
        options: UploadOptions,
        api_base: Option<String>,
        timeout: Duration,
    ) -> MediaResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            api_base: api_base
                .unwrap_or_else(|| CLOUDINARY_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            options,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/{}/upload",
            self.api_base, self.credentials.cloud_name, self.options.resource_type
        )
    }

    /// Parameters covered by the signature.
    fn signed_params(&self, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("folder", self.options.folder.clone());
        params.insert("timestamp", timestamp.to_string());
        let transformation = self.options.transformation();
        if !transformation.is_empty() {
            params.insert("transformation", transformation);
        }
        params
    }

    fn build_form(&self, upload: VideoUpload, timestamp: i64) -> MediaResult<Form> {
        let params = self.signed_params(timestamp);
        let signature = sign_params(&params, &self.credentials.api_secret);

        let length = upload.data.len() as u64;
        let mut file_part = Part::stream_with_length(upload.data, length)
            .file_name(upload.file_name.unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = upload.content_type.as_deref() {
            file_part = file_part
                .mime_str(content_type)
                .map_err(|e| MediaError::Client(e.to_string()))?;
        }

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }
        Ok(form)
    }
}

#[async_trait]
impl MediaService for CloudinaryClient {
    #[tracing::instrument(skip(self, upload), fields(bytes = upload.len(), folder = %self.options.folder))]
    async fn upload_video(&self, upload: VideoUpload) -> MediaResult<UploadedAsset> {
        let form = self.build_form(upload, Utc::now().timestamp())?;

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let asset: UploadedAsset = serde_json::from_str(&body)
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            public_id = %asset.public_id,
            bytes = asset.bytes,
            duration = ?asset.duration,
            "Video accepted by media service"
        );
        Ok(asset)
    }
}
