//! In-memory storage variant.
//!
//! All three relations live behind one lock, so every read-modify-write
//! (duplicate check then insert, lookup then delete) is a single critical
//! section. Data does not survive a restart.

use super::{EventFilter, StorageAdapter, StorageBackend, StorageError};
use crate::models::{Attendance, Event, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-memory store, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct TransientStore {
    inner: Arc<RwLock<TransientInner>>,
}

#[derive(Debug, Default)]
struct TransientInner {
    users: HashMap<String, User>,
    /// Lowercased email -> user id
    emails: HashMap<String, String>,
    events: HashMap<String, Event>,
    /// Keyed by (user_id, event_id)
    attendances: HashMap<(String, String), Attendance>,
}

impl TransientStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}

fn pair(user_id: &str, event_id: &str) -> (String, String) {
    (user_id.to_string(), event_id.to_string())
}

#[async_trait]
impl StorageAdapter for TransientStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Transient
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_user(&self, user: User) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let email_key = user.email.to_lowercase();

        if inner.users.contains_key(&user.id) || inner.emails.contains_key(&email_key) {
            return Err(StorageError::Duplicate("user"));
        }

        inner.emails.insert(email_key, user.id.clone());
        inner.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StorageError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(&email.to_lowercase())
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(users)
    }

    async fn put_event(&self, event: Event) -> Result<(), StorageError> {
        self.inner
            .write()
            .await
            .events
            .insert(event.id.clone(), event);
        Ok(())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, StorageError> {
        Ok(self.inner.read().await.events.get(id).cloned())
    }

    async fn find_events(&self, filter: EventFilter) -> Result<Vec<Event>, StorageError> {
        let inner = self.inner.read().await;
        let mut events: Vec<Event> = match &filter {
            EventFilter::All => inner.events.values().cloned().collect(),
            EventFilter::Public => inner
                .events
                .values()
                .filter(|e| e.visibility == crate::models::Visibility::Public)
                .cloned()
                .collect(),
            EventFilter::CreatedBy(creator_id) => inner
                .events
                .values()
                .filter(|e| &e.creator_id == creator_id)
                .cloned()
                .collect(),
            EventFilter::Ids(ids) => {
                let mut seen = std::collections::HashSet::new();
                ids.iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .filter_map(|id| inner.events.get(id))
                    .cloned()
                    .collect()
            }
        };
        sort_events(&mut events);
        Ok(events)
    }

    async fn delete_event(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.inner.write().await.events.remove(id).is_some())
    }

    async fn put_attendance(&self, attendance: Attendance) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let key = pair(&attendance.user_id, &attendance.event_id);

        if inner.attendances.contains_key(&key) {
            return Err(StorageError::Duplicate("attendance"));
        }
        inner.attendances.insert(key, attendance);
        Ok(())
    }

    async fn get_attendance(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Attendance>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .attendances
            .get(&pair(user_id, event_id))
            .cloned())
    }

    async fn find_attendances_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Attendance>, StorageError> {
        let mut found: Vec<Attendance> = self
            .inner
            .read()
            .await
            .attendances
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        Ok(found)
    }

    async fn count_attendees(&self, event_id: &str) -> Result<u64, StorageError> {
        let count = self
            .inner
            .read()
            .await
            .attendances
            .values()
            .filter(|a| a.event_id == event_id)
            .count();
        Ok(count as u64)
    }

    async fn delete_attendance(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<bool, StorageError> {
        Ok(self
            .inner
            .write()
            .await
            .attendances
            .remove(&pair(user_id, event_id))
            .is_some())
    }
}
