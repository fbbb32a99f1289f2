//! HTTP routes.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::services::AttendanceLedger;
use crate::storage::StorageAdapter;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage adapter selected at startup.
    pub store: Arc<dyn StorageAdapter>,

    /// Attendance ledger over the same store.
    pub ledger: AttendanceLedger,

    /// Session token issuer and verifier.
    pub codec: Arc<TokenCodec>,

    pub config: Config,

    /// True when running on the transient fallback store.
    pub degraded: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StorageAdapter>,
        codec: Arc<TokenCodec>,
        config: Config,
        degraded: bool,
    ) -> Self {
        Self {
            ledger: AttendanceLedger::new(store.clone()),
            store,
            codec,
            config,
            degraded,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - storage backend and degraded flag - public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - `/api/v1/users` (POST), `/api/v1/login` - registration and login - public
/// - `/api/v1/events` (GET), `/api/v1/events/:id` (GET) - public reads
/// - everything else under `/api/v1` - requires a Bearer token
/// - CORS for the configured web client origin
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        codec: state.codec.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/users", post(handlers::register))
        .route("/api/v1/login", post(handlers::login))
        .route("/api/v1/events", get(handlers::list_events))
        .route("/api/v1/events/:id", get(handlers::get_event))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/v1/users", get(handlers::list_users))
        .route("/api/v1/me", get(handlers::get_me))
        .route("/api/v1/me/events", get(handlers::my_events))
        .route("/api/v1/me/attending", get(handlers::my_attending))
        .route("/api/v1/events", post(handlers::create_event))
        .route(
            "/api/v1/events/:id",
            axum::routing::put(handlers::update_event).delete(handlers::delete_event),
        )
        .route("/api/v1/events/:id/join", post(handlers::join_event))
        .route("/api/v1/events/:id/leave", post(handlers::leave_event))
        .route(
            "/api/v1/events/:id/attendance",
            get(handlers::attendance_status),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state.clone());

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflights before auth runs
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_allowed_origin))
        .layer(middleware::from_fn(http_metrics_middleware))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Config validation already rejected origins that are not header values.
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => layer,
    }
}
