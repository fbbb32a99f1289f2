//! Session token claims and the identity they assert.
//!
//! `sub` and `email` identify a person and are redacted in Debug output.

use crate::models::{Role, User};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by an EventEase session token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id) - redacted in Debug output.
    pub sub: String,

    /// Email address - redacted in Debug output.
    pub email: String,

    /// Display name.
    pub name: String,

    pub role: Role,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Authenticated identity attached to a request by the auth middleware.
///
/// A token is a cached, time-limited assertion of this record; the stored
/// user remains the source of truth.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish()
    }
}

impl Identity {
    /// Build the claims for this identity with the given validity window.
    pub fn to_claims(&self, iat: i64, exp: i64) -> Claims {
        Claims {
            sub: self.id.clone(),
            email: self.email.clone(),
            name: self.display_name.clone(),
            role: self.role,
            iat,
            exp,
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            display_name: claims.name,
            role: claims.role,
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
        }
    }
}
