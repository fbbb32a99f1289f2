//! Authentication gate for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it with
//! the [`TokenCodec`] and injects the resulting [`Identity`] into request
//! extensions. Any failure stops the request with 401; there is no fallback
//! identity.

use crate::auth::{Identity, TokenCodec};
use crate::errors::EeError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<TokenCodec>,
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer_token(req: &Request) -> Result<&str, EeError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "ee.middleware.auth", "Missing Authorization header");
            EeError::Unauthenticated("Missing Authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "ee.middleware.auth", "Invalid Authorization header format");
        EeError::Unauthenticated("Invalid Authorization header format".to_string())
    })?;

    if token.trim().is_empty() {
        tracing::debug!(target: "ee.middleware.auth", "Empty bearer token");
        return Err(EeError::Unauthenticated(
            "Invalid Authorization header format".to_string(),
        ));
    }

    Ok(token.trim())
}

/// Authentication middleware.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token is missing, malformed or expired
/// - Continues to the next handler with `Identity` in extensions otherwise
#[instrument(skip_all, name = "ee.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, EeError> {
    let token = extract_bearer_token(&req)?;

    let identity: Identity = state.codec.verify(token).map_err(|e| {
        tracing::debug!(target: "ee.middleware.auth", error = ?e, "Token rejected");
        EeError::from(e)
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
