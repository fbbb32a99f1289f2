//! EventEase service configuration.
//!
//! Configuration is loaded from environment variables. Secrets are held in
//! `SecretString` and redacted in Debug output.

use common::jwt::{
    DEFAULT_CLOCK_SKEW, DEFAULT_TOKEN_TTL, MAX_CLOCK_SKEW, MAX_TOKEN_TTL, MIN_HMAC_SECRET_BYTES,
};
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default time allowed for the startup database probe.
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest and highest work factor bcrypt accepts.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Default browser origin of the web client.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// EventEase service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL. Unset selects the transient store.
    pub database_url: Option<SecretString>,

    /// Server bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// HMAC-SHA256 secret for session tokens.
    pub jwt_secret: SecretString,

    /// Lifetime of issued session tokens.
    pub token_ttl: Duration,

    /// Tolerance for `iat` values in the future.
    pub jwt_clock_skew: Duration,

    /// Time allowed to connect to the durable store at startup.
    pub db_connect_timeout: Duration,

    pub bcrypt_cost: u32,

    pub cors_allowed_origin: String,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("jwt_clock_skew", &self.jwt_clock_skew)
            .field("db_connect_timeout", &self.db_connect_timeout)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid database connect timeout: {0}")]
    InvalidConnectTimeout(String),

    #[error("Invalid bcrypt cost: {0}")]
    InvalidBcryptCost(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| SecretString::from(url.clone()));

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_secret = SecretString::from(
            vars.get("JWT_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?
                .clone(),
        );
        if jwt_secret.expose_secret().len() < MIN_HMAC_SECRET_BYTES {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_HMAC_SECRET_BYTES
            )));
        }

        // Parse token TTL with validation
        let token_ttl = if let Some(value_str) = vars.get("TOKEN_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidTokenTtl(
                    "TOKEN_TTL_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_TOKEN_TTL.as_secs() {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must not exceed {} seconds, got {}",
                    MAX_TOKEN_TTL.as_secs(),
                    value
                )));
            }

            Duration::from_secs(value)
        } else {
            DEFAULT_TOKEN_TTL
        };

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            let value = value.unsigned_abs();
            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            Duration::from_secs(value)
        } else {
            DEFAULT_CLOCK_SKEW
        };

        let db_connect_timeout = if let Some(value_str) = vars.get("DB_CONNECT_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidConnectTimeout(format!(
                    "DB_CONNECT_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidConnectTimeout(
                    "DB_CONNECT_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_DB_CONNECT_TIMEOUT_SECONDS)
        };

        let bcrypt_cost = if let Some(value_str) = vars.get("BCRYPT_COST") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&value) {
                return Err(ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be between {} and {}, got {}",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST, value
                )));
            }

            value
        } else {
            DEFAULT_BCRYPT_COST
        };

        let cors_allowed_origin = vars
            .get("CORS_ALLOWED_ORIGIN")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string());
        if axum::http::HeaderValue::from_str(&cors_allowed_origin).is_err() {
            return Err(ConfigError::InvalidCorsOrigin(format!(
                "CORS_ALLOWED_ORIGIN is not a valid header value: '{}'",
                cors_allowed_origin
            )));
        }

        Ok(Config {
            database_url,
            bind_address,
            jwt_secret,
            token_ttl,
            jwt_clock_skew,
            db_connect_timeout,
            bcrypt_cost,
            cors_allowed_origin,
        })
    }
}
