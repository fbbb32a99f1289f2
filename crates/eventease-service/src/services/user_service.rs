//! User registration and credential login.

use crate::auth::{Identity, TokenCodec};
use crate::errors::EeError;
use crate::models::{
    record_timestamp, RegisterRequest, Role, TokenResponse, User, MIN_PASSWORD_LENGTH,
};
use crate::storage::{StorageAdapter, StorageError};
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;
use uuid::Uuid;

/// Hash verified when the email is unknown, so both paths cost one bcrypt run.
const DUMMY_PASSWORD_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Register a new user with role USER.
///
/// # Errors
///
/// - `BadRequest` for an empty name, malformed email or short password
/// - `Conflict` if the email is already registered
#[instrument(skip_all, name = "ee.services.register_user")]
pub async fn register_user(
    store: &dyn StorageAdapter,
    bcrypt_cost: u32,
    request: RegisterRequest,
) -> Result<User, EeError> {
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(EeError::BadRequest("Invalid email format".to_string()));
    }

    if request.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(EeError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let display_name = request.name.trim().to_string();
    if display_name.is_empty() {
        return Err(EeError::BadRequest("Name cannot be empty".to_string()));
    }

    let password_hash = hash_password(request.password, bcrypt_cost).await?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        display_name,
        password_hash,
        role: Role::User,
        created_at: record_timestamp(),
    };

    match store.put_user(user.clone()).await {
        Ok(()) => {
            tracing::info!(target: "ee.services.user", "User registered");
            Ok(user)
        }
        Err(StorageError::Duplicate(_)) => Err(EeError::Conflict(
            "An account with this email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Verify credentials and issue a session token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
#[instrument(skip_all, name = "ee.services.login")]
pub async fn login(
    store: &dyn StorageAdapter,
    codec: &TokenCodec,
    email: &str,
    password: SecretString,
) -> Result<TokenResponse, EeError> {
    let user = store.find_user_by_email(&normalize_email(email)).await?;

    let hash_to_verify = match &user {
        Some(u) => u.password_hash.clone(),
        None => DUMMY_PASSWORD_HASH.to_string(),
    };
    let is_valid = verify_password(password, hash_to_verify).await?;

    let user = match user {
        Some(u) if is_valid => u,
        _ => {
            tracing::debug!(target: "ee.services.user", "Login rejected");
            return Err(EeError::Unauthenticated("Invalid credentials".to_string()));
        }
    };

    let access_token = codec.issue(&Identity::from(&user))?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: codec.ttl().as_secs(),
    })
}

pub async fn list_users(store: &dyn StorageAdapter) -> Result<Vec<User>, EeError> {
    Ok(store.list_users().await?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email validation: `local@domain.tld` with no empty parts.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    domain_parts.len() >= 2 && domain_parts.iter().all(|p| !p.is_empty())
}

/// bcrypt runs on the blocking pool so request tasks keep making progress.
async fn hash_password(password: SecretString, cost: u32) -> Result<String, EeError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), cost))
        .await
        .map_err(|e| {
            tracing::error!(target: "ee.services.user", error = %e, "Password hashing task failed");
            EeError::Internal
        })?
        .map_err(|e| {
            tracing::error!(target: "ee.services.user", error = %e, "Password hashing failed");
            EeError::Internal
        })
}

async fn verify_password(password: SecretString, hash: String) -> Result<bool, EeError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password.expose_secret(), &hash))
        .await
        .map_err(|e| {
            tracing::error!(target: "ee.services.user", error = %e, "Password verification task failed");
            EeError::Internal
        })?
        .map_err(|e| {
            tracing::error!(target: "ee.services.user", error = %e, "Password verification failed");
            EeError::Internal
        })
}
