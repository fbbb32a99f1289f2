//! HTTP request handlers.

pub mod attendance;
pub mod auth;
pub mod events;
pub mod health;
pub mod me;
pub mod metrics;
pub mod users;

pub use attendance::{attendance_status, join_event, leave_event};
pub use auth::{login, register};
pub use events::{create_event, delete_event, get_event, list_events, update_event};
pub use health::health_check;
pub use me::{get_me, my_attending, my_events};
pub use metrics::metrics_handler;
pub use users::list_users;

use crate::errors::EeError;
use serde::de::DeserializeOwned;

/// Decode a JSON request body, returning 400 (not axum's default 422) on failure.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, EeError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "ee.handlers", error = %e, "Invalid request body");
        EeError::BadRequest("Invalid request body".to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::LoginRequest;

    #[test]
    fn test_decode_body_rejects_malformed_json_as_bad_request() {
        let err = decode_body::<LoginRequest>(b"{\"email\": ").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_decode_body_rejects_missing_field() {
        let err = decode_body::<LoginRequest>(br#"{"email":"a@example.com"}"#).unwrap_err();
        assert!(matches!(err, EeError::BadRequest(_)));
    }

    #[test]
    fn test_decode_body_accepts_valid_payload() {
        let req: LoginRequest =
            decode_body(br#"{"email":"a@example.com","password":"pw"}"#).unwrap();
        assert_eq!(req.email, "a@example.com");
    }
}
