//! Handlers scoped to the authenticated caller.

use crate::auth::Identity;
use crate::errors::EeError;
use crate::models::{EventResponse, Role};
use crate::routes::AppState;
use crate::services::event_service;
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Response for `/api/v1/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.display_name,
            email: identity.email,
            role: identity.role,
        }
    }
}

/// Handler for GET /api/v1/me
///
/// Answers from the verified token alone; the store is not consulted.
#[instrument(skip_all, name = "ee.handlers.me")]
pub async fn get_me(Extension(identity): Extension<Identity>) -> Json<MeResponse> {
    Json(MeResponse::from(identity))
}

/// Handler for GET /api/v1/me/events
///
/// Every event the caller created, public and private.
#[instrument(skip_all, name = "ee.handlers.my_events")]
pub async fn my_events(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<EventResponse>>, EeError> {
    let store = state.store.as_ref();
    let events = event_service::list_created_by(store, &identity.id).await?;
    Ok(Json(event_service::to_responses(store, events).await?))
}

/// Handler for GET /api/v1/me/attending
#[instrument(skip_all, name = "ee.handlers.my_attending")]
pub async fn my_attending(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<EventResponse>>, EeError> {
    let events = state.ledger.list_for_user(&identity.id).await?;
    Ok(Json(
        event_service::to_responses(state.store.as_ref(), events).await?,
    ))
}
