use thiserror::Error;

/// Errors from the media processing service.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Request to media service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Media service rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected media service response: {0}")]
    InvalidResponse(String),
}

pub type MediaResult<T> = Result<T, MediaError>;
