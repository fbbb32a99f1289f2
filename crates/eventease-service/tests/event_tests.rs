//! Integration tests for event endpoints and the ownership guard.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use eventease_test_utils::*;
use serde_json::{json, Value};

fn replacement(title: &str) -> Value {
    json!({
        "title": title,
        "description": "changed",
        "date": "2027-01-15T09:00:00Z",
        "location": "Elsewhere",
        "max_attendees": 99,
        "visibility": "PRIVATE",
    })
}

#[tokio::test]
async fn test_create_and_get_event() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;
    let event_id = server.create_event(&alice, "Launch").await?;

    let event: Value = server
        .client()
        .get(format!("{}/api/v1/events/{}", server.url(), event_id))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(event["title"], "Launch");
    assert_eq!(event["creator_id"], alice.id.as_str());
    assert_eq!(event["visibility"], "PUBLIC");
    assert_eq!(event["capacity"], 10);
    assert_eq!(event["current_attendees"], 0);
    Ok(())
}

#[tokio::test]
async fn test_create_event_requires_auth() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/events", server.url()))
        .json(&replacement("Anonymous"))
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    assert!(server
        .store()
        .find_events(eventease_service::storage::EventFilter::All)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_event_rejects_bad_bodies() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;

    for body in [
        json!({ "title": "", "date": "2026-12-01T18:00:00Z" }),
        json!({ "title": "No date" }),
        json!({ "title": "Negative", "date": "2026-12-01T18:00:00Z", "capacity": -5 }),
        json!({ "title": "Odd", "date": "2026-12-01T18:00:00Z", "visibility": "SECRET" }),
    ] {
        let response = server
            .client()
            .post(format!("{}/api/v1/events", server.url()))
            .bearer_auth(&alice.token)
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), 400, "body {body} should be rejected");
    }
    Ok(())
}

#[tokio::test]
async fn test_public_listing_hides_private_events() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;

    server.create_event(&alice, "Open house").await?;
    let private_id = server
        .create_event_with(
            &alice,
            json!({
                "title": "Board meeting",
                "date": "2026-12-02T10:00:00Z",
                "visibility": "PRIVATE",
            }),
        )
        .await?;

    let listed: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/events", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed.len(), 1);
    assert!(listed.iter().all(|e| e["id"] != private_id.as_str()));

    // The id still works as a direct link.
    let response = server
        .client()
        .get(format!("{}/api/v1/events/{}", server.url(), private_id))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    // The creator sees both in their own listing.
    let mine: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/me/events", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(mine.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_is_public_false_keeps_event_out_of_public_listing() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;

    let hidden_id = server
        .create_event_with(
            &alice,
            json!({
                "title": "Staff retro",
                "date": "2026-12-03T10:00:00Z",
                "max_attendees": 5,
                "is_public": false,
            }),
        )
        .await?;

    let created: Value = server
        .client()
        .get(format!("{}/api/v1/events/{}", server.url(), hidden_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(created["visibility"], "PRIVATE");
    assert_eq!(created["capacity"], 5);

    let listed: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/events", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert!(listed.iter().all(|e| e["id"] != hidden_id.as_str()));

    let mine: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/me/events", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?
        .json()
        .await?;
    assert!(mine.iter().any(|e| e["id"] == hidden_id.as_str()));
    Ok(())
}

#[tokio::test]
async fn test_get_missing_event_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/events/{}", server.url(), TEST_EVENT_MISSING))
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_creator_can_update_event() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;
    let event_id = server.create_event(&alice, "Launch").await?;
    let before = server.store().get_event(&event_id).await?.unwrap();

    let response = server
        .client()
        .put(format!("{}/api/v1/events/{}", server.url(), event_id))
        .bearer_auth(&alice.token)
        .json(&replacement("Relaunch"))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await?;
    assert_eq!(updated["title"], "Relaunch");
    assert_eq!(updated["capacity"], 99);
    assert_eq!(updated["visibility"], "PRIVATE");
    assert_eq!(updated["creator_id"], alice.id.as_str());

    let after = server.store().get_event(&event_id).await?.unwrap();
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);
    Ok(())
}

#[tokio::test]
async fn test_non_creator_update_is_forbidden_and_event_unchanged() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;
    let bob = server.register_and_login("Bob", "bob@example.com").await?;
    let event_id = server.create_event(&alice, "Launch").await?;
    let before = server.store().get_event(&event_id).await?.unwrap();

    let response = server
        .client()
        .put(format!("{}/api/v1/events/{}", server.url(), event_id))
        .bearer_auth(&bob.token)
        .json(&replacement("Hijacked"))
        .send()
        .await?;

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let after = server.store().get_event(&event_id).await?.unwrap();
    assert_eq!(after, before);
    Ok(())
}

#[tokio::test]
async fn test_admin_token_does_not_bypass_ownership() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;
    let event_id = server.create_event(&alice, "Launch").await?;

    let admin = TestTokenBuilder::new()
        .for_user(TEST_USER_CHARLIE)
        .with_role("ADMIN")
        .sign();

    let response = server
        .client()
        .delete(format!("{}/api/v1/events/{}", server.url(), event_id))
        .bearer_auth(&admin)
        .send()
        .await?;

    assert_eq!(response.status(), 403);
    assert!(server.store().get_event(&event_id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_delete_by_creator_then_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.register_and_login("Alice", "alice@example.com").await?;
    let bob = server.register_and_login("Bob", "bob@example.com").await?;
    let event_id = server.create_event(&alice, "Launch").await?;

    let response = server
        .client()
        .delete(format!("{}/api/v1/events/{}", server.url(), event_id))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(response.status(), 403);

    let response = server
        .client()
        .delete(format!("{}/api/v1/events/{}", server.url(), event_id))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let response = server
        .client()
        .get(format!("{}/api/v1/events/{}", server.url(), event_id))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let response = server
        .client()
        .delete(format!("{}/api/v1/events/{}", server.url(), event_id))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    Ok(())
}
