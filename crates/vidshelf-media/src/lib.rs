//! Vidshelf media service client
//!
//! The `MediaService` trait is the seam between the upload handler and the
//! remote processing service; `CloudinaryClient` is the production implementation.

pub mod cloudinary;
pub mod error;
pub mod traits;

pub use cloudinary::{sign_params, CloudinaryClient};
pub use error::{MediaError, MediaResult};
pub use traits::{MediaService, UploadOptions, UploadedAsset, VideoUpload};
