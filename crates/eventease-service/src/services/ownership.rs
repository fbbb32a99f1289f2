//! Event ownership guard.
//!
//! Applied to event update and delete, never to reads.

use crate::auth::Identity;
use crate::errors::EeError;
use crate::models::Event;

/// Permit mutation only when the acting identity created the event.
///
/// Role does not matter: an ADMIN who is not the creator is refused too.
pub fn check_ownership(identity: &Identity, event: &Event) -> Result<(), EeError> {
    if identity.id == event.creator_id {
        return Ok(());
    }

    tracing::debug!(
        target: "ee.services.ownership",
        event_id = %event.id,
        "Event mutation refused: caller is not the creator"
    );
    Err(EeError::Forbidden(
        "Only the event creator may modify this event".to_string(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{Role, Visibility};
    use chrono::Utc;

    fn identity(id: &str, role: Role) -> Identity {
        Identity {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            display_name: id.to_string(),
            role,
        }
    }

    fn event_by(creator: &str) -> Event {
        let now = Utc::now();
        Event {
            id: "e1".to_string(),
            title: "Launch".to_string(),
            description: String::new(),
            date: now,
            location: String::new(),
            capacity: None,
            visibility: Visibility::Public,
            creator_id: creator.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_creator_is_allowed() {
        assert!(check_ownership(&identity("a", Role::User), &event_by("a")).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let err = check_ownership(&identity("b", Role::User), &event_by("a")).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_admin_who_is_not_creator_is_forbidden() {
        let err = check_ownership(&identity("root", Role::Admin), &event_by("a")).unwrap_err();
        assert!(matches!(err, EeError::Forbidden(_)));
    }
}
