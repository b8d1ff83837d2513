//! Vidshelf API Library
//!
//! HTTP handlers, identity middleware and application setup.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::ErrorResponse;
