use crate::auth::identity::IdentityProvider;
use crate::auth::models::AuthContext;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Resolve the caller once per request and record it in the request extensions.
///
/// Requests without a valid identity pass through unchanged; handlers that
/// require one reject through the `AuthContext` extractor.
pub async fn identity_middleware(
    State(identity): State<Arc<dyn IdentityProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user_id) = identity.current_user(request.headers()).await {
        tracing::debug!(user_id = %user_id, "Authenticated request");
        request.extensions_mut().insert(AuthContext { user_id });
    }

    next.run(request).await
}
