//! Application state shared by all handlers.
//!
//! Every collaborator is constructed explicitly in `setup::services` (or by
//! tests) and injected here; handlers never reach for process-wide clients.

use crate::auth::IdentityProvider;
use std::sync::Arc;
use vidshelf_db::VideoRepository;
use vidshelf_media::MediaService;

#[derive(Clone)]
pub struct AppState {
    pub videos: Arc<dyn VideoRepository>,
    /// `None` when media service credentials are not configured.
    pub media: Option<Arc<dyn MediaService>>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        media: Option<Arc<dyn MediaService>>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            videos,
            media,
            identity,
        }
    }
}
