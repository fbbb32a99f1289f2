//! Event handlers.
//!
//! Listing and single-event reads are public. Create, update and delete
//! require an identity; update and delete also require ownership.

use crate::auth::Identity;
use crate::errors::EeError;
use crate::handlers::decode_body;
use crate::models::{EventRequest, EventResponse, MessageResponse};
use crate::routes::AppState;
use crate::services::event_service;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/events
#[instrument(skip_all, name = "ee.handlers.create_event")]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<(StatusCode, Json<EventResponse>), EeError> {
    let request: EventRequest = decode_body(&body)?;

    let event = event_service::create_event(state.store.as_ref(), &identity, request).await?;

    Ok((StatusCode::CREATED, Json(EventResponse::new(event, 0))))
}

/// Handler for GET /api/v1/events
///
/// Public events only, ordered by date.
#[instrument(skip_all, name = "ee.handlers.list_events")]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EventResponse>>, EeError> {
    let store = state.store.as_ref();
    let events = event_service::list_public_events(store).await?;
    Ok(Json(event_service::to_responses(store, events).await?))
}

/// Handler for GET /api/v1/events/:id
///
/// Private events are returned too; knowing the id is enough.
#[instrument(skip_all, name = "ee.handlers.get_event", fields(event_id = %event_id))]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<EventResponse>, EeError> {
    let store = state.store.as_ref();
    let event = event_service::get_event(store, &event_id).await?;
    Ok(Json(event_service::to_response(store, event).await?))
}

/// Handler for PUT /api/v1/events/:id
///
/// # Errors
///
/// - 403 Forbidden: caller did not create the event (event left unchanged)
/// - 404 Not Found: no such event
#[instrument(skip_all, name = "ee.handlers.update_event", fields(event_id = %event_id))]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
    body: Bytes,
) -> Result<Json<EventResponse>, EeError> {
    let request: EventRequest = decode_body(&body)?;
    let store = state.store.as_ref();

    let event = event_service::update_event(store, &identity, &event_id, request).await?;
    Ok(Json(event_service::to_response(store, event).await?))
}

/// Handler for DELETE /api/v1/events/:id
#[instrument(skip_all, name = "ee.handlers.delete_event", fields(event_id = %event_id))]
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
) -> Result<Json<MessageResponse>, EeError> {
    event_service::delete_event(state.store.as_ref(), &identity, &event_id).await?;

    Ok(Json(MessageResponse {
        message: "Event deleted".to_string(),
    }))
}
