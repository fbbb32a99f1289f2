//! Attendance ledger.
//!
//! Owns the user x event "attends" relation. Per pair the relation is a
//! two-state machine: ABSENT --join--> JOINED --leave--> ABSENT. Joining from
//! JOINED and leaving from ABSENT are rejected, never silently accepted.
//!
//! Uniqueness of the pair is enforced by the storage layer in the same step
//! as the insert, so two concurrent joins cannot both succeed.

use crate::errors::EeError;
use crate::models::{record_timestamp, Attendance, Event};
use crate::observability::metrics::record_attendance_operation;
use crate::storage::{EventFilter, StorageAdapter, StorageError};
use std::sync::Arc;
use tracing::instrument;

/// Attendance operations over the active storage adapter.
#[derive(Clone)]
pub struct AttendanceLedger {
    store: Arc<dyn StorageAdapter>,
}

impl AttendanceLedger {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// Record that `user_id` attends `event_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `AlreadyJoined` if the pair is already recorded
    #[instrument(skip_all, name = "ee.ledger.join")]
    pub async fn join(&self, user_id: &str, event_id: &str) -> Result<(), EeError> {
        let result = self.join_inner(user_id, event_id).await;
        record_attendance_operation("join", outcome(&result));
        result
    }

    async fn join_inner(&self, user_id: &str, event_id: &str) -> Result<(), EeError> {
        self.require_event(event_id).await?;

        let attendance = Attendance {
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            joined_at: record_timestamp(),
        };

        match self.store.put_attendance(attendance).await {
            Ok(()) => {
                tracing::debug!(target: "ee.ledger", event_id = %event_id, "Attendance recorded");
                Ok(())
            }
            Err(StorageError::Duplicate(_)) => Err(EeError::AlreadyJoined),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the attendance of `user_id` at `event_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the event does not exist
    /// - `NotJoined` if no attendance is recorded for the pair
    #[instrument(skip_all, name = "ee.ledger.leave")]
    pub async fn leave(&self, user_id: &str, event_id: &str) -> Result<(), EeError> {
        let result = self.leave_inner(user_id, event_id).await;
        record_attendance_operation("leave", outcome(&result));
        result
    }

    async fn leave_inner(&self, user_id: &str, event_id: &str) -> Result<(), EeError> {
        self.require_event(event_id).await?;

        if self.store.delete_attendance(user_id, event_id).await? {
            tracing::debug!(target: "ee.ledger", event_id = %event_id, "Attendance removed");
            Ok(())
        } else {
            Err(EeError::NotJoined)
        }
    }

    /// Pure lookup. Absence, and a backend failure, both read as `false`.
    #[instrument(skip_all, name = "ee.ledger.is_attending")]
    pub async fn is_attending(&self, user_id: &str, event_id: &str) -> bool {
        match self.store.get_attendance(user_id, event_id).await {
            Ok(found) => {
                record_attendance_operation("is_attending", "success");
                found.is_some()
            }
            Err(e) => {
                tracing::warn!(
                    target: "ee.ledger",
                    error = %e,
                    "Attendance lookup failed, reporting not attending"
                );
                record_attendance_operation("is_attending", "backend_error");
                false
            }
        }
    }

    /// Events the user attends, ordered by event date. Attendances whose
    /// event no longer exists are skipped.
    #[instrument(skip_all, name = "ee.ledger.list_for_user")]
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Event>, EeError> {
        let result = self.list_for_user_inner(user_id).await;
        record_attendance_operation("list_for_user", outcome(&result));
        result
    }

    async fn list_for_user_inner(&self, user_id: &str) -> Result<Vec<Event>, EeError> {
        let event_ids: Vec<String> = self
            .store
            .find_attendances_for_user(user_id)
            .await?
            .into_iter()
            .map(|a| a.event_id)
            .collect();

        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let requested = event_ids.len();
        let events = self.store.find_events(EventFilter::Ids(event_ids)).await?;
        if events.len() < requested {
            tracing::debug!(
                target: "ee.ledger",
                skipped = requested - events.len(),
                "Skipped attendances referencing deleted events"
            );
        }
        Ok(events)
    }

    /// Number of attendance records for an event.
    pub async fn attendee_count(&self, event_id: &str) -> Result<u64, EeError> {
        Ok(self.store.count_attendees(event_id).await?)
    }

    async fn require_event(&self, event_id: &str) -> Result<Event, EeError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| EeError::NotFound("Event not found".to_string()))
    }
}

/// Bounded `result` label for ledger metrics.
fn outcome<T>(result: &Result<T, EeError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(EeError::NotFound(_)) => "not_found",
        Err(EeError::AlreadyJoined) => "already_joined",
        Err(EeError::NotJoined) => "not_joined",
        Err(_) => "backend_error",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::Visibility;
    use crate::storage::TransientStore;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, day: u32) -> Event {
        let date = Utc.with_ymd_and_hms(2026, 12, day, 19, 0, 0).unwrap();
        Event {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            date,
            location: String::new(),
            capacity: Some(1),
            visibility: Visibility::Public,
            creator_id: "creator".to_string(),
            created_at: date,
            updated_at: date,
        }
    }

    async fn ledger_with(events: &[Event]) -> (AttendanceLedger, Arc<TransientStore>) {
        let store = Arc::new(TransientStore::new());
        for e in events {
            store.put_event(e.clone()).await.unwrap();
        }
        (AttendanceLedger::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_join_unknown_event_is_not_found() {
        let (ledger, store) = ledger_with(&[]).await;

        let err = ledger.join("u1", "missing").await.unwrap_err();
        assert!(matches!(err, EeError::NotFound(_)));
        assert!(store.get_attendance("u1", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_join_twice_is_already_joined_with_one_record() {
        let (ledger, store) = ledger_with(&[event("e1", 1)]).await;

        ledger.join("u1", "e1").await.unwrap();
        let err = ledger.join("u1", "e1").await.unwrap_err();

        assert!(matches!(err, EeError::AlreadyJoined));
        assert_eq!(store.count_attendees("e1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_capacity_is_not_admission_controlled() {
        let (ledger, _) = ledger_with(&[event("e1", 1)]).await;

        ledger.join("u1", "e1").await.unwrap();
        ledger.join("u2", "e1").await.unwrap();
        assert_eq!(ledger.attendee_count("e1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_leave_without_join_is_not_joined() {
        let (ledger, _) = ledger_with(&[event("e1", 1)]).await;

        let err = ledger.leave("u1", "e1").await.unwrap_err();
        assert!(matches!(err, EeError::NotJoined));
    }

    #[tokio::test]
    async fn test_leave_unknown_event_is_not_found() {
        let (ledger, _) = ledger_with(&[]).await;

        let err = ledger.leave("u1", "missing").await.unwrap_err();
        assert!(matches!(err, EeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_join_leave_then_not_attending() {
        let (ledger, _) = ledger_with(&[event("e1", 1)]).await;

        ledger.join("u1", "e1").await.unwrap();
        assert!(ledger.is_attending("u1", "e1").await);

        ledger.leave("u1", "e1").await.unwrap();
        assert!(!ledger.is_attending("u1", "e1").await);

        // The pair is back in ABSENT, so a fresh join succeeds.
        ledger.join("u1", "e1").await.unwrap();
    }

    #[tokio::test]
    async fn test_is_attending_unknown_pair_is_false() {
        let (ledger, _) = ledger_with(&[]).await;
        assert!(!ledger.is_attending("nobody", "nothing").await);
    }

    #[tokio::test]
    async fn test_list_for_user_skips_deleted_events() {
        let (ledger, store) =
            ledger_with(&[event("late", 20), event("early", 3), event("gone", 9)]).await;

        ledger.join("u1", "late").await.unwrap();
        ledger.join("u1", "gone").await.unwrap();
        ledger.join("u1", "early").await.unwrap();
        ledger.join("u2", "late").await.unwrap();
        store.delete_event("gone").await.unwrap();

        let ids: Vec<String> = ledger
            .list_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_list_for_user_without_attendances_is_empty() {
        let (ledger, _) = ledger_with(&[event("e1", 1)]).await;
        assert!(ledger.list_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_joins_admit_exactly_one() {
        let (ledger, store) = ledger_with(&[event("e1", 1)]).await;

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.join("u1", "e1").await })
            })
            .collect();

        let mut successes = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(EeError::AlreadyJoined) => already += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(already, 11);
        assert_eq!(store.count_attendees("e1").await.unwrap(), 1);
    }
}
