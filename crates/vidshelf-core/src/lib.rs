//! Vidshelf Core Library
//!
//! This crate provides the domain model, error taxonomy and configuration
//! shared by the store, media and HTTP crates.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{AuthConfig, AuthKeySource, BaseConfig, CloudinaryCredentials, Config, MediaConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
