//! EventEase error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients for backend failures are intentionally
//! generic; the actual errors are logged server-side.

use crate::auth::TokenError;
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// EventEase error type.
///
/// Maps to appropriate HTTP status codes:
/// - Unauthenticated: 401 Unauthorized
/// - Forbidden: 403 Forbidden
/// - NotFound: 404 Not Found
/// - AlreadyJoined, Conflict: 409 Conflict
/// - NotJoined: 422 Unprocessable Entity
/// - BadRequest: 400 Bad Request
/// - Database, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum EeError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already joined")]
    AlreadyJoined,

    #[error("Not joined")]
    NotJoined,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl EeError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            EeError::Unauthenticated(_) => 401,
            EeError::Forbidden(_) => 403,
            EeError::NotFound(_) => 404,
            EeError::AlreadyJoined | EeError::Conflict(_) => 409,
            EeError::NotJoined => 422,
            EeError::BadRequest(_) => 400,
            EeError::Database(_) | EeError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for EeError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            EeError::Unauthenticated(reason) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", reason.clone())
            }
            EeError::Forbidden(reason) => (StatusCode::FORBIDDEN, "FORBIDDEN", reason.clone()),
            EeError::NotFound(resource) => (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone()),
            EeError::AlreadyJoined => (
                StatusCode::CONFLICT,
                "ALREADY_JOINED",
                "User is already attending this event".to_string(),
            ),
            EeError::NotJoined => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOT_JOINED",
                "User is not attending this event".to_string(),
            ),
            EeError::Conflict(reason) => (StatusCode::CONFLICT, "CONFLICT", reason.clone()),
            EeError::BadRequest(reason) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone()),
            EeError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "ee.database", error = %err, "Storage operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            EeError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"eventease-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Storage failures surface as the generic backend class, except a duplicate
/// key which the caller did not translate into a domain error itself.
impl From<StorageError> for EeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(what) => EeError::Conflict(format!("{} already exists", what)),
            StorageError::Backend(detail) => EeError::Database(detail),
        }
    }
}

/// Token failures never fall back to a default identity.
impl From<TokenError> for EeError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Malformed => {
                EeError::Unauthenticated(err.to_string())
            }
            TokenError::Signing => EeError::Internal,
        }
    }
}
