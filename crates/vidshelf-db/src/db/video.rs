//! Video repository: create and list rows of the `videos` table.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use vidshelf_core::models::{NewVideoRecord, VideoRecord};
use vidshelf_core::AppError;

/// Store operations over `VideoRecord`.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert a new record and return it with its store-assigned id and timestamps.
    async fn create(&self, video: NewVideoRecord) -> Result<VideoRecord, AppError>;

    /// All records, most recently created first.
    async fn list_newest_first(&self) -> Result<Vec<VideoRecord>, AppError>;

    /// Cheap round trip used by the readiness probe.
    async fn health_check(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed `VideoRepository`.
///
/// Each operation borrows a pooled connection for the duration of a single
/// statement; the connection goes back to the pool when the query future
/// finishes or is dropped.
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", public_id = %video.public_id))]
    async fn create(&self, video: NewVideoRecord) -> Result<VideoRecord, AppError> {
        let row = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            INSERT INTO videos (title, description, public_id, original_size, compressed_size, duration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, public_id, original_size, compressed_size,
                      duration, created_at, updated_at
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.public_id)
        .bind(&video.original_size)
        .bind(&video.compressed_size)
        .bind(video.duration)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(video_id = %row.id, "Video record created");
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_newest_first(&self) -> Result<Vec<VideoRecord>, AppError> {
        let rows = sqlx::query_as::<Postgres, VideoRecord>(
            r#"
            SELECT id, title, description, public_id, original_size, compressed_size,
                   duration, created_at, updated_at
            FROM videos
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
