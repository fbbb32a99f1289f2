//! Test server harness for E2E testing
//!
//! Provides `TestServer` for spawning real EventEase server instances in tests.

use crate::test_ids::{TEST_BCRYPT_COST, TEST_JWT_SECRET, TEST_PASSWORD};
use common::secret::SecretString;
use eventease_service::auth::TokenCodec;
use eventease_service::config::Config;
use eventease_service::routes::{self, AppState};
use eventease_service::storage::{DurableStore, StorageAdapter, TransientStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A registered user and a session token for them.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Test harness for spawning the EventEase server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> anyhow::Result<()> {
///     let server = TestServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestServer {
    addr: SocketAddr,
    store: Arc<dyn StorageAdapter>,
    config: Config,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server over a fresh transient store, reporting degraded mode
    /// the same way production does when no database is configured.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(TransientStore::new()), true).await
    }

    /// Spawn a server over a durable store backed by `pool`
    /// (typically from `#[sqlx::test]`).
    pub async fn spawn_with_pool(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(DurableStore::from_pool(pool)), false).await
    }

    /// Spawn a server over an arbitrary storage adapter.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with_store(
        store: Arc<dyn StorageAdapter>,
        degraded: bool,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string()),
            ("BCRYPT_COST".to_string(), TEST_BCRYPT_COST.to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let codec = Arc::new(TokenCodec::new(
            &SecretString::from(TEST_JWT_SECRET),
            config.token_ttl,
            config.jwt_clock_skew,
        ));

        let state = Arc::new(AppState::new(
            store.clone(),
            codec,
            config.clone(),
            degraded,
        ));

        // Recorder is built but not installed: each test server gets its own
        // handle and the global recorder stays free.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            config,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Direct access to the store the server runs on.
    pub fn store(&self) -> &Arc<dyn StorageAdapter> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Register a user through the API and log them in.
    pub async fn register_and_login(
        &self,
        name: &str,
        email: &str,
    ) -> Result<TestUser, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/users", self.url()))
            .json(&json!({ "name": name, "email": email, "password": TEST_PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == 201,
            "registration failed with {}",
            response.status()
        );
        let user: Value = response.json().await?;
        let id = user["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("registration response has no id"))?
            .to_string();

        let token = self.login(email, TEST_PASSWORD).await?;

        Ok(TestUser {
            id,
            email: email.to_string(),
            token,
        })
    }

    /// Log in and return the access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/login", self.url()))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == 200,
            "login failed with {}",
            response.status()
        );
        let body: Value = response.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("login response has no access_token"))
    }

    /// Create a public event as `user` and return its id.
    pub async fn create_event(&self, user: &TestUser, title: &str) -> Result<String, anyhow::Error> {
        self.create_event_with(
            user,
            json!({
                "title": title,
                "description": "test event",
                "date": "2026-12-01T18:00:00Z",
                "location": "Room 1",
                "capacity": 10,
            }),
        )
        .await
    }

    /// Create an event from a raw JSON body as `user` and return its id.
    pub async fn create_event_with(
        &self,
        user: &TestUser,
        body: Value,
    ) -> Result<String, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/events", self.url()))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == 201,
            "event creation failed with {}",
            response.status()
        );
        let event: Value = response.json().await?;
        event["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("event response has no id"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.config().bcrypt_cost.to_string(), TEST_BCRYPT_COST);
        assert!(server.config().database_url.is_none());

        let response = reqwest::get(format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await?;
        assert_eq!(body["storage"], "transient");
        assert_eq!(body["degraded"], true);

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_servers_different_ports() -> Result<(), anyhow::Error> {
        let server1 = TestServer::spawn().await?;
        let server2 = TestServer::spawn().await?;

        assert_ne!(server1.addr(), server2.addr());
        assert!(server1.addr().ip().is_loopback());

        Ok(())
    }

    #[tokio::test]
    async fn test_register_and_login_returns_usable_token() -> Result<(), anyhow::Error> {
        let server = TestServer::spawn().await?;
        let user = server.register_and_login("Dana", "dana@example.com").await?;

        let response = server
            .client()
            .get(format!("{}/api/v1/me", server.url()))
            .bearer_auth(&user.token)
            .send()
            .await?;

        assert_eq!(response.status(), 200);
        let me: Value = response.json().await?;
        assert_eq!(me["id"], user.id.as_str());

        Ok(())
    }
}
