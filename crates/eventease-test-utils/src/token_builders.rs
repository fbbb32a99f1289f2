//! Builder for hand-crafted session tokens.
//!
//! Tokens issued through `/api/v1/login` cover the normal path; this builder
//! covers what login never produces (expired, future-dated, wrong secret,
//! missing claims).

use crate::test_ids::{TEST_JWT_SECRET, TEST_USER_ALICE};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for test session tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .expired()
///     .sign();
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    email: String,
    name: String,
    role: String,
    exp: i64,
    iat: i64,
    secret: String,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults: Alice, role USER, valid for an hour.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Some(TEST_USER_ALICE.to_string()),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            role: "USER".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            secret: TEST_JWT_SECRET.to_string(),
        }
    }

    /// Set the subject (user id)
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Drop the `sub` claim entirely
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the role claim verbatim (may be a value the server does not know)
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Expired an hour ago, issued two hours ago
    pub fn expired(mut self) -> Self {
        let now = Utc::now();
        self.iat = (now - Duration::seconds(7200)).timestamp();
        self.exp = (now - Duration::seconds(3600)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a secret other than the server's
    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Build the claims as a JSON value
    pub fn build_claims(&self) -> Value {
        let mut claims = Map::new();
        if let Some(sub) = &self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        claims.insert("email".to_string(), json!(self.email));
        claims.insert("name".to_string(), json!(self.name));
        claims.insert("role".to_string(), json!(self.role));
        claims.insert("iat".to_string(), json!(self.iat));
        claims.insert("exp".to_string(), json!(self.exp));
        Value::Object(claims)
    }

    /// Sign the claims with HS256
    pub fn sign(self) -> String {
        encode(
            &Header::default(),
            &self.build_claims(),
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("HS256 signing of test claims should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
