//! API path constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Upload endpoint, relative to `API_PREFIX`.
pub const VIDEO_UPLOAD_PATH: &str = "/video-upload";

/// Listing endpoint, relative to `API_PREFIX`.
pub const VIDEOS_PATH: &str = "/videos";

/// Cookie carrying the session token when no `Authorization` header is sent.
pub const SESSION_COOKIE: &str = "__session";
