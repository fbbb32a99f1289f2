//! Attendance handlers.
//!
//! The acting user is always the authenticated identity; there is no way to
//! join or leave on behalf of someone else.

use crate::auth::Identity;
use crate::errors::EeError;
use crate::models::{AttendanceStatusResponse, MessageResponse};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/events/:id/join
///
/// # Errors
///
/// - 404 Not Found: no such event
/// - 409 Conflict: caller already attends
#[instrument(skip_all, name = "ee.handlers.join_event", fields(event_id = %event_id))]
pub async fn join_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
) -> Result<Json<MessageResponse>, EeError> {
    state.ledger.join(&identity.id, &event_id).await?;

    Ok(Json(MessageResponse {
        message: "Joined event".to_string(),
    }))
}

/// Handler for POST /api/v1/events/:id/leave
///
/// # Errors
///
/// - 404 Not Found: no such event
/// - 422 Unprocessable Entity: caller does not attend
#[instrument(skip_all, name = "ee.handlers.leave_event", fields(event_id = %event_id))]
pub async fn leave_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
) -> Result<Json<MessageResponse>, EeError> {
    state.ledger.leave(&identity.id, &event_id).await?;

    Ok(Json(MessageResponse {
        message: "Left event".to_string(),
    }))
}

/// Handler for GET /api/v1/events/:id/attendance
///
/// Never fails: an unknown event, an absent record and a backend error all
/// read as not attending.
#[instrument(skip_all, name = "ee.handlers.attendance_status", fields(event_id = %event_id))]
pub async fn attendance_status(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
) -> Json<AttendanceStatusResponse> {
    let is_attending = state.ledger.is_attending(&identity.id, &event_id).await;

    Json(AttendanceStatusResponse {
        event_id,
        is_attending,
    })
}
