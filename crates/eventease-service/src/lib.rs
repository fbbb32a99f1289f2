//! EventEase service library.
//!
//! Identity and attendance backend for the EventEase event platform:
//!
//! - Stateless session tokens (HS256) issued at login and verified per request
//! - Event management with creator-only update and delete
//! - An attendance ledger with at-most-one record per user and event
//! - Durable PostgreSQL storage with an in-memory fallback selected at startup
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> storage/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Claims, identities and the token codec
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Auth gate and HTTP metrics
//! - `models` - Domain records and API payloads
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Ledger, ownership guard, user and event services
//! - `storage` - Storage adapter trait, durable and transient stores

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
pub mod storage;
