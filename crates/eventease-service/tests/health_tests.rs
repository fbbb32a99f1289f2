//! Integration tests for the operational endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use eventease_test_utils::*;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

#[tokio::test]
async fn test_health_reports_degraded_transient_store() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["storage"], "transient");
    assert_eq!(body["degraded"], true);
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_health_reports_healthy_when_not_degraded() -> Result<()> {
    let server = TestServer::spawn_with_store(
        Arc::new(eventease_service::storage::TransientStore::new()),
        false,
    )
    .await?;

    let body: Value = reqwest::get(format!("{}/health", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["degraded"], false);
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/v1/nowhere", server.url())).await?;
    assert_eq!(response.status(), 404);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_health_reports_durable_store(pool: PgPool) -> Result<()> {
    let server = TestServer::spawn_with_pool(pool).await?;

    let body: Value = reqwest::get(format!("{}/health", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "durable");
    assert_eq!(body["degraded"], false);
    Ok(())
}
