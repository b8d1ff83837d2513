//! Construction of the clients injected into `AppState`.

use crate::auth::{IdentityProvider, JwtIdentityProvider};
use crate::state::AppState;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use vidshelf_core::Config;
use vidshelf_db::{PgVideoRepository, VideoRepository};
use vidshelf_media::{CloudinaryClient, MediaService, UploadOptions};

/// Build the media service client, or `None` when credentials are missing.
pub fn setup_media_service(config: &Config) -> Result<Option<Arc<dyn MediaService>>> {
    let Some(credentials) = config.media.credentials.clone() else {
        tracing::warn!("Cloudinary credentials not set; video uploads will be rejected");
        return Ok(None);
    };

    let cloud_name = credentials.cloud_name.clone();
    let client = CloudinaryClient::new(
        credentials,
        UploadOptions::auto_optimized_video(config.media.upload_folder.clone()),
        config.media.api_base.clone(),
        Duration::from_secs(config.media.upload_timeout_secs),
    )
    .context("Failed to create Cloudinary client")?;

    tracing::info!(
        cloud_name = %cloud_name,
        folder = %config.media.upload_folder,
        "Media service configured"
    );
    Ok(Some(Arc::new(client)))
}

/// Initialize all services and repositories
pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let videos: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));

    let media = setup_media_service(config)?;

    let identity: Arc<dyn IdentityProvider> = Arc::new(
        JwtIdentityProvider::from_config(&config.auth)
            .context("Failed to create identity provider")?,
    );

    Ok(Arc::new(AppState::new(videos, media, identity)))
}
