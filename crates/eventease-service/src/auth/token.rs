//! Session token codec.
//!
//! Issues and verifies HS256 bearer tokens carrying [`Claims`].
//!
//! # Security
//!
//! - Tokens are size-checked and the header `alg` must be HS256 before any
//!   signature work is done
//! - Expiry is checked against an explicit `now` with zero leeway
//! - `iat` may not lie further in the future than the configured clock skew
//! - Every failure is a rejection; there is no fallback identity

use crate::auth::claims::{Claims, Identity};
use crate::observability::metrics::record_token_validation;
use common::jwt::{require_session_alg, validate_iat_at};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Token failures.
///
/// Display strings are generic so clients learn nothing about why a token
/// was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("The access token is invalid or expired")]
    Expired,

    #[error("The access token is invalid or expired")]
    Malformed,

    #[error("Failed to sign access token")]
    Signing,
}

/// Issues and verifies session tokens with a process-wide HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock_skew: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec.
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC-SHA256 signing secret
    /// * `ttl` - Lifetime of issued tokens
    /// * `clock_skew` - Tolerance for `iat` values in the future
    pub fn new(secret: &SecretString, ttl: Duration, clock_skew: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            ttl,
            clock_skew,
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity`, valid from now for the configured TTL.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    #[instrument(skip_all, name = "ee.auth.issue")]
    pub fn issue_at(&self, identity: &Identity, now: i64) -> Result<String, TokenError> {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).map_err(|_| TokenError::Signing)?;
        let claims = identity.to_claims(now, now.saturating_add(ttl_secs));

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| {
            tracing::error!(target: "ee.auth.token", error = %e, "Token signing failed");
            TokenError::Signing
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// - `Expired` when `now > exp`
    /// - `Malformed` for oversized tokens, a non-HS256 header, a bad
    ///   signature, missing or empty claims, or an `iat` too far ahead
    #[instrument(skip_all, name = "ee.auth.verify")]
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Identity, TokenError> {
        let result = self.verify_inner(token, now);
        record_token_validation(match &result {
            Ok(_) => "success",
            Err(TokenError::Expired) => "expired",
            Err(_) => "malformed",
        });
        result
    }

    fn verify_inner(&self, token: &str, now: i64) -> Result<Identity, TokenError> {
        require_session_alg(token).map_err(|e| {
            tracing::debug!(target: "ee.auth.token", error = ?e, "Token header rejected");
            TokenError::Malformed
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the injected clock below.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(target: "ee.auth.token", error = %e, "Token verification failed");
                TokenError::Malformed
            })?
            .claims;

        if claims.sub.is_empty() {
            tracing::debug!(target: "ee.auth.token", "Token rejected: empty subject");
            return Err(TokenError::Malformed);
        }

        if now > claims.exp {
            tracing::debug!(
                target: "ee.auth.token",
                exp = claims.exp,
                now = now,
                "Token rejected: expired"
            );
            return Err(TokenError::Expired);
        }

        validate_iat_at(claims.iat, self.clock_skew, now).map_err(|e| {
            tracing::debug!(target: "ee.auth.token", error = ?e, "Token iat validation failed");
            TokenError::Malformed
        })?;

        Ok(Identity::from(claims))
    }
}
