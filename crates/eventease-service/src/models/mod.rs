//! EventEase models.
//!
//! Domain records shared by every storage backend, plus the request and
//! response bodies of the HTTP API.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current time truncated to microseconds, the precision PostgreSQL keeps.
///
/// Every record timestamp comes from here so both storage backends hold
/// identical values.
pub fn record_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Role carried in user records and session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Returns the stored string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse a stored role. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Event visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUBLIC" => Some(Visibility::Public),
            "PRIVATE" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Registered user. The durable record is the source of truth for identity.
#[derive(Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The password hash never appears in Debug output.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Event owned by its creator.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    /// Advertised only; joins are not admission-controlled against it.
    pub capacity: Option<i32>,
    pub visibility: Visibility,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the attends relation. `(user_id, event_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendance {
    pub user_id: String,
    pub event_id: String,
    pub joined_at: DateTime<Utc>,
}

// ============================================================================
// API Models
// ============================================================================

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: common::secret::SecretString,
}

/// Request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: common::secret::SecretString,
}

/// Bearer token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Public view of a user (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.display_name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Request body for creating or replacing an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "max_attendees")]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Boolean visibility flag used by older clients. Takes precedence over
    /// `visibility` when present.
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl EventRequest {
    /// Visibility the stored event should carry.
    pub fn resolved_visibility(&self) -> Visibility {
        match self.is_public {
            Some(true) => Visibility::Public,
            Some(false) => Visibility::Private,
            None => self.visibility,
        }
    }
}

/// Event as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    pub visibility: Visibility,
    pub creator_id: String,
    pub current_attendees: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(event: Event, current_attendees: u64) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            capacity: event.capacity,
            visibility: event.visibility,
            creator_id: event.creator_id,
            current_attendees,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Response for `GET /api/v1/events/{id}/attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceStatusResponse {
    pub event_id: String,
    pub is_attending: bool,
}

/// Response body for acknowledgement-only operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
///
/// Returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "degraded" or "unhealthy").
    pub status: String,

    /// Active storage backend ("durable" or "transient").
    pub storage: String,

    /// True when running on the transient fallback store.
    pub degraded: bool,

    pub timestamp: DateTime<Utc>,
}
