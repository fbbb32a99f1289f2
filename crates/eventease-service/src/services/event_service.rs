//! Event create, read, update and delete.
//!
//! Update and delete pass through [`check_ownership`]; reads never do.

use crate::auth::Identity;
use crate::errors::EeError;
use crate::models::{record_timestamp, Event, EventRequest, EventResponse};
use crate::services::ownership::check_ownership;
use crate::storage::{EventFilter, StorageAdapter};
use tracing::instrument;
use uuid::Uuid;

fn validate(request: &EventRequest) -> Result<(), EeError> {
    if request.title.trim().is_empty() {
        return Err(EeError::BadRequest("Title cannot be empty".to_string()));
    }
    if matches!(request.capacity, Some(c) if c < 0) {
        return Err(EeError::BadRequest(
            "Capacity cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Create an event owned by `identity`.
#[instrument(skip_all, name = "ee.services.create_event")]
pub async fn create_event(
    store: &dyn StorageAdapter,
    identity: &Identity,
    request: EventRequest,
) -> Result<Event, EeError> {
    validate(&request)?;

    let visibility = request.resolved_visibility();
    let now = record_timestamp();
    let event = Event {
        id: Uuid::new_v4().to_string(),
        title: request.title.trim().to_string(),
        description: request.description,
        date: request.date,
        location: request.location,
        capacity: request.capacity,
        visibility,
        creator_id: identity.id.clone(),
        created_at: now,
        updated_at: now,
    };

    store.put_event(event.clone()).await?;
    tracing::info!(target: "ee.services.event", event_id = %event.id, "Event created");
    Ok(event)
}

pub async fn get_event(store: &dyn StorageAdapter, event_id: &str) -> Result<Event, EeError> {
    store
        .get_event(event_id)
        .await?
        .ok_or_else(|| EeError::NotFound("Event not found".to_string()))
}

/// Replace the mutable fields of an event. Creator only.
#[instrument(skip_all, name = "ee.services.update_event")]
pub async fn update_event(
    store: &dyn StorageAdapter,
    identity: &Identity,
    event_id: &str,
    request: EventRequest,
) -> Result<Event, EeError> {
    let existing = get_event(store, event_id).await?;
    check_ownership(identity, &existing)?;
    validate(&request)?;

    let visibility = request.resolved_visibility();
    let updated = Event {
        title: request.title.trim().to_string(),
        description: request.description,
        date: request.date,
        location: request.location,
        capacity: request.capacity,
        visibility,
        updated_at: record_timestamp(),
        ..existing
    };

    store.put_event(updated.clone()).await?;
    tracing::info!(target: "ee.services.event", event_id = %event_id, "Event updated");
    Ok(updated)
}

/// Delete an event. Creator only. Attendances of the event are left in place.
#[instrument(skip_all, name = "ee.services.delete_event")]
pub async fn delete_event(
    store: &dyn StorageAdapter,
    identity: &Identity,
    event_id: &str,
) -> Result<(), EeError> {
    let existing = get_event(store, event_id).await?;
    check_ownership(identity, &existing)?;

    if !store.delete_event(event_id).await? {
        return Err(EeError::NotFound("Event not found".to_string()));
    }
    tracing::info!(target: "ee.services.event", event_id = %event_id, "Event deleted");
    Ok(())
}

pub async fn list_public_events(store: &dyn StorageAdapter) -> Result<Vec<Event>, EeError> {
    Ok(store.find_events(EventFilter::Public).await?)
}

/// Every event created by `user_id`, public and private.
pub async fn list_created_by(
    store: &dyn StorageAdapter,
    user_id: &str,
) -> Result<Vec<Event>, EeError> {
    Ok(store
        .find_events(EventFilter::CreatedBy(user_id.to_string()))
        .await?)
}

/// Attach `current_attendees` to each event.
pub async fn to_responses(
    store: &dyn StorageAdapter,
    events: Vec<Event>,
) -> Result<Vec<EventResponse>, EeError> {
    let mut responses = Vec::with_capacity(events.len());
    for event in events {
        responses.push(to_response(store, event).await?);
    }
    Ok(responses)
}

pub async fn to_response(store: &dyn StorageAdapter, event: Event) -> Result<EventResponse, EeError> {
    let count = store.count_attendees(&event.id).await?;
    Ok(EventResponse::new(event, count))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{Attendance, Role, Visibility};
    use crate::storage::TransientStore;
    use chrono::{TimeZone, Utc};

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            display_name: id.to_string(),
            role: Role::User,
        }
    }

    fn request(title: &str, visibility: Visibility) -> EventRequest {
        EventRequest {
            title: title.to_string(),
            description: "desc".to_string(),
            date: Utc.with_ymd_and_hms(2026, 11, 5, 18, 30, 0).unwrap(),
            location: "Main hall".to_string(),
            capacity: Some(50),
            visibility,
            is_public: None,
        }
    }

    #[tokio::test]
    async fn test_create_sets_creator_and_timestamps() {
        let store = TransientStore::new();
        let event = create_event(&store, &identity("a"), request("  Meetup ", Visibility::Public))
            .await
            .unwrap();

        assert_eq!(event.creator_id, "a");
        assert_eq!(event.title, "Meetup");
        assert_eq!(event.created_at, event.updated_at);
        assert_eq!(get_event(&store, &event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_and_negative_capacity() {
        let store = TransientStore::new();

        let err = create_event(&store, &identity("a"), request(" ", Visibility::Public))
            .await
            .unwrap_err();
        assert!(matches!(err, EeError::BadRequest(_)));

        let mut bad = request("Ok", Visibility::Public);
        bad.capacity = Some(-1);
        let err = create_event(&store, &identity("a"), bad).await.unwrap_err();
        assert!(matches!(err, EeError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_by_creator_bumps_updated_at() {
        let store = TransientStore::new();
        let event = create_event(&store, &identity("a"), request("Old", Visibility::Public))
            .await
            .unwrap();

        let updated = update_event(&store, &identity("a"), &event.id, request("New", Visibility::Private))
            .await
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.visibility, Visibility::Private);
        assert_eq!(updated.creator_id, "a");
        assert_eq!(updated.created_at, event.created_at);
        assert!(updated.updated_at >= event.updated_at);
    }

    #[tokio::test]
    async fn test_update_by_other_is_forbidden_and_event_unchanged() {
        let store = TransientStore::new();
        let event = create_event(&store, &identity("a"), request("Mine", Visibility::Public))
            .await
            .unwrap();

        let err = update_event(&store, &identity("b"), &event.id, request("Hijacked", Visibility::Public))
            .await
            .unwrap_err();

        assert!(matches!(err, EeError::Forbidden(_)));
        assert_eq!(get_event(&store, &event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_delete_by_other_is_forbidden_and_event_kept() {
        let store = TransientStore::new();
        let event = create_event(&store, &identity("a"), request("Mine", Visibility::Public))
            .await
            .unwrap();

        let err = delete_event(&store, &identity("b"), &event.id).await.unwrap_err();
        assert!(matches!(err, EeError::Forbidden(_)));
        assert!(store.get_event(&event.id).await.unwrap().is_some());

        delete_event(&store, &identity("a"), &event.id).await.unwrap();
        assert!(matches!(
            get_event(&store, &event.id).await,
            Err(EeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_event_is_not_found() {
        let store = TransientStore::new();
        let err = update_event(&store, &identity("a"), "nope", request("X", Visibility::Public))
            .await
            .unwrap_err();
        assert!(matches!(err, EeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_public_listing_hides_private_events() {
        let store = TransientStore::new();
        create_event(&store, &identity("a"), request("Open", Visibility::Public))
            .await
            .unwrap();
        create_event(&store, &identity("a"), request("Closed", Visibility::Private))
            .await
            .unwrap();

        let public = list_public_events(&store).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public.first().unwrap().title, "Open");

        assert_eq!(list_created_by(&store, "a").await.unwrap().len(), 2);
        assert!(list_created_by(&store, "b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_responses_carry_attendee_count() {
        let store = TransientStore::new();
        let event = create_event(&store, &identity("a"), request("Open", Visibility::Public))
            .await
            .unwrap();
        for user in ["u1", "u2"] {
            store
                .put_attendance(Attendance {
                    user_id: user.to_string(),
                    event_id: event.id.clone(),
                    joined_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let responses = to_responses(&store, vec![event]).await.unwrap();
        assert_eq!(responses.first().unwrap().current_attendees, 2);
    }
}
