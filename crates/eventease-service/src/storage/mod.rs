//! Storage adapter for users, events and attendances.
//!
//! One capability surface, two variants:
//!
//! - [`DurableStore`] - PostgreSQL via sqlx
//! - [`TransientStore`] - process memory, lost on restart
//!
//! [`select_storage`] probes the durable store once at startup and falls back
//! to the transient variant when it is unreachable. Everything above this
//! module is written once against [`StorageAdapter`].

pub mod durable;
pub mod transient;

pub use durable::DurableStore;
pub use transient::TransientStore;

use crate::models::{Attendance, Event, User};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Storage failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A uniqueness rule rejected the write (user email, attendance pair).
    #[error("Duplicate {0}")]
    Duplicate(&'static str),

    /// Any other backend failure. Detail is for server-side logs only.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Which variant is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Durable,
    Transient,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Durable => "durable",
            StorageBackend::Transient => "transient",
        }
    }
}

/// Event query. Results are ordered by event date, then id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Public,
    CreatedBy(String),
    Ids(Vec<String>),
}

/// Capability surface shared by both storage variants.
///
/// Both variants must behave identically for every operation, including
/// which situations produce [`StorageError::Duplicate`].
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    fn backend(&self) -> StorageBackend;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Insert a new user. `Duplicate("user")` if the id or email is taken.
    async fn put_user(&self, user: User) -> Result<(), StorageError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, StorageError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// All users ordered by creation time.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// Insert or replace an event by id.
    async fn put_event(&self, event: Event) -> Result<(), StorageError>;

    async fn get_event(&self, id: &str) -> Result<Option<Event>, StorageError>;

    async fn find_events(&self, filter: EventFilter) -> Result<Vec<Event>, StorageError>;

    /// Returns whether an event was removed. Attendances are not touched.
    async fn delete_event(&self, id: &str) -> Result<bool, StorageError>;

    /// Insert an attendance. `Duplicate("attendance")` if the pair exists.
    ///
    /// The uniqueness check and the insert are a single atomic step.
    async fn put_attendance(&self, attendance: Attendance) -> Result<(), StorageError>;

    async fn get_attendance(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Attendance>, StorageError>;

    /// Attendances of a user ordered by join time.
    async fn find_attendances_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Attendance>, StorageError>;

    async fn count_attendees(&self, event_id: &str) -> Result<u64, StorageError>;

    /// Returns whether a record was removed.
    async fn delete_attendance(&self, user_id: &str, event_id: &str)
        -> Result<bool, StorageError>;
}

/// Result of startup storage selection.
#[derive(Clone)]
pub struct StorageSelection {
    pub store: Arc<dyn StorageAdapter>,

    /// True when the transient fallback is bound.
    pub degraded: bool,
}

/// Bind the durable store if it answers, otherwise the transient one.
///
/// Never fails: an unreachable database degrades the service instead of
/// stopping it.
pub async fn select_storage(database_url: Option<&str>, connect_timeout: Duration) -> StorageSelection {
    let Some(url) = database_url else {
        tracing::warn!(
            target: "ee.storage",
            "DATABASE_URL not set, using transient in-memory store (data is lost on restart)"
        );
        return transient_selection();
    };

    match DurableStore::connect(url, connect_timeout).await {
        Ok(store) => {
            tracing::info!(target: "ee.storage", "Durable store connected");
            StorageSelection {
                store: Arc::new(store),
                degraded: false,
            }
        }
        Err(e) => {
            tracing::warn!(
                target: "ee.storage",
                error = %e,
                "Durable store unreachable, using transient in-memory store (data is lost on restart)"
            );
            transient_selection()
        }
    }
}

fn transient_selection() -> StorageSelection {
    StorageSelection {
        store: Arc::new(TransientStore::new()),
        degraded: true,
    }
}
