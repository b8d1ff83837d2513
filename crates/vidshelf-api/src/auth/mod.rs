//! Caller identity: session token verification and the request extractor.

pub mod identity;
pub mod jwks;
pub mod middleware;
pub mod models;

pub use identity::{extract_session_token, IdentityProvider, JwtIdentityProvider};
pub use models::{AuthContext, SessionClaims, UserId};
