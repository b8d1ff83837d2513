//! Database repositories for the data access layer
//!
//! Handlers depend on the repository traits, so tests can substitute in-memory
//! implementations for the PostgreSQL ones.

pub mod video;

pub use video::{PgVideoRepository, VideoRepository};

/// Embedded schema migrations (workspace `migrations/`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
