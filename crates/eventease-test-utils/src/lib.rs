//! # EventEase Test Utilities
//!
//! Shared test utilities for the EventEase service.
//!
//! This crate provides:
//! - Server test harness (`TestServer` for E2E tests)
//! - Token builders for hand-crafted, expired or tampered session tokens
//! - Fixed test IDs and credentials
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eventease_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestServer::spawn().await?;
//!     let alice = server.register_and_login("Alice", "alice@example.com").await?;
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/v1/me", server.url()))
//!         .bearer_auth(&alice.token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
