//! Registration and login handlers.

use crate::errors::EeError;
use crate::handlers::decode_body;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::routes::AppState;
use crate::services::user_service;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/users
///
/// # Errors
///
/// - 400 Bad Request: malformed body, invalid email, short password, empty name
/// - 409 Conflict: email already registered
#[instrument(skip_all, name = "ee.handlers.register")]
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserResponse>), EeError> {
    let request: RegisterRequest = decode_body(&body)?;

    let user =
        user_service::register_user(state.store.as_ref(), state.config.bcrypt_cost, request)
            .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Handler for POST /api/v1/login
///
/// Returns 401 with a single generic message for unknown email and wrong
/// password alike.
#[instrument(skip_all, name = "ee.handlers.login")]
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, EeError> {
    let request: LoginRequest = decode_body(&body)?;

    let response = user_service::login(
        state.store.as_ref(),
        &state.codec,
        &request.email,
        request.password,
    )
    .await?;

    Ok(Json(response))
}
