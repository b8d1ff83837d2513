//! Test helpers: in-memory collaborators and a router built the way `main` builds it.
//!
//! Run from workspace root: `cargo test -p vidshelf-api`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use vidshelf_api::auth::{IdentityProvider, JwtIdentityProvider, SessionClaims};
use vidshelf_api::setup::routes::setup_routes;
use vidshelf_api::state::AppState;
use vidshelf_core::models::{NewVideoRecord, VideoRecord};
use vidshelf_core::{AppError, Config};
use vidshelf_db::VideoRepository;
use vidshelf_media::{MediaError, MediaResult, MediaService, UploadedAsset, VideoUpload};

/// HS256 secret shared by the identity provider and `session_token`.
pub const TEST_SESSION_SECRET: &str = "vidshelf-test-session-secret-0123456789";

/// Signed session token for `user_id`, valid for an hour.
pub fn session_token(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: Some(now),
        nbf: None,
        iss: None,
        azp: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SESSION_SECRET.as_bytes()),
    )
    .expect("encode session token")
}

/// `VideoRepository` kept in memory. Insertion order breaks timestamp ties.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    records: Mutex<Vec<VideoRecord>>,
    fail: Mutex<bool>,
    creates: AtomicUsize,
}

impl InMemoryVideoRepository {
    pub fn with_records(records: Vec<VideoRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Make every subsequent operation fail with a database error.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn records(&self) -> Vec<VideoRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(&self, video: NewVideoRecord) -> Result<VideoRecord, AppError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let now = Utc::now();
        let record = VideoRecord {
            id: Uuid::new_v4(),
            title: video.title,
            description: video.description,
            public_id: video.public_id,
            original_size: video.original_size,
            compressed_size: video.compressed_size,
            duration: video.duration,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_newest_first(&self) -> Result<Vec<VideoRecord>, AppError> {
        self.check()?;
        let mut records: Vec<(usize, VideoRecord)> =
            self.records().into_iter().enumerate().collect();
        records.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// `MediaService` that answers every upload with the same outcome.
pub struct FakeMediaService {
    outcome: Result<UploadedAsset, (u16, String)>,
    calls: AtomicUsize,
    uploads: Mutex<Vec<VideoUpload>>,
}

impl FakeMediaService {
    pub fn succeeding(public_id: &str, bytes: u64, duration: Option<f64>) -> Self {
        Self::with_outcome(Ok(UploadedAsset {
            public_id: public_id.to_string(),
            bytes,
            duration,
            secure_url: None,
            format: Some("mp4".to_string()),
        }))
    }

    pub fn rejecting(status: u16, message: &str) -> Self {
        Self::with_outcome(Err((status, message.to_string())))
    }

    fn with_outcome(outcome: Result<UploadedAsset, (u16, String)>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<VideoUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaService for FakeMediaService {
    async fn upload_video(&self, upload: VideoUpload) -> MediaResult<UploadedAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(upload);
        match &self.outcome {
            Ok(asset) => Ok(asset.clone()),
            Err((status, message)) => Err(MediaError::Rejected {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// A stored record with an explicit creation time.
pub fn video_record(public_id: &str, created_at: DateTime<Utc>) -> VideoRecord {
    VideoRecord {
        id: Uuid::new_v4(),
        title: format!("Video {}", public_id),
        description: None,
        public_id: public_id.to_string(),
        original_size: "1000".to_string(),
        compressed_size: "500".to_string(),
        duration: 1.5,
        created_at,
        updated_at: created_at,
    }
}

pub fn test_config() -> Config {
    test_config_with(&[])
}

/// Test configuration with extra environment entries layered on top.
pub fn test_config_with(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "postgres://localhost/vidshelf_test"),
        ("AUTH_JWT_SECRET", TEST_SESSION_SECRET),
    ]);
    vars.extend(extra.iter().copied());
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

/// Test application: server plus handles on the fakes behind it.
pub struct TestApp {
    pub server: TestServer,
    pub videos: Arc<InMemoryVideoRepository>,
    pub media: Option<Arc<FakeMediaService>>,
}

impl TestApp {
    pub fn media_calls(&self) -> usize {
        self.media.as_ref().map(|m| m.calls()).unwrap_or(0)
    }
}

/// Build the real router over the given fakes. `media: None` leaves the media service unconfigured.
pub fn setup_test_app(
    videos: InMemoryVideoRepository,
    media: Option<FakeMediaService>,
) -> TestApp {
    setup_test_app_with_config(videos, media, &test_config())
}

pub fn setup_test_app_with_config(
    videos: InMemoryVideoRepository,
    media: Option<FakeMediaService>,
    config: &Config,
) -> TestApp {
    let videos = Arc::new(videos);
    let media = media.map(Arc::new);
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(JwtIdentityProvider::with_shared_secret(TEST_SESSION_SECRET));

    let state = Arc::new(AppState::new(
        videos.clone(),
        media.clone().map(|m| m as Arc<dyn MediaService>),
        identity,
    ));

    let router = setup_routes(config, state).expect("router");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        videos,
        media,
    }
}
