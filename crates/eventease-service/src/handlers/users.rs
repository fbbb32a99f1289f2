//! User directory handler.

use crate::errors::EeError;
use crate::models::UserResponse;
use crate::routes::AppState;
use crate::services::user_service;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Handler for GET /api/v1/users (authenticated)
#[tracing::instrument(skip_all, name = "ee.handlers.list_users")]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, EeError> {
    let users = user_service::list_users(state.store.as_ref()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
