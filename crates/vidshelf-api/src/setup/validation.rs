//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use vidshelf_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.media.credentials_partial {
        tracing::warn!("Cloudinary credentials are only partially set; uploads will be rejected");
    } else if config.media.credentials.is_none() {
        tracing::warn!(
            "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET are required for uploads"
        );
    }

    if config.is_production() && config.auth.issuer.is_none() {
        tracing::warn!("AUTH_ISSUER not set - session tokens from any issuer using the configured keys are accepted");
    }

    match config.max_upload_size_bytes() {
        Some(limit) => tracing::info!(max_upload_bytes = limit, "Upload size limit enabled"),
        None => tracing::info!("Upload size limit disabled"),
    }

    Ok(())
}
