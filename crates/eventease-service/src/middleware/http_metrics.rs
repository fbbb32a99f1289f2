//! HTTP metrics middleware.
//!
//! Records every response, including framework-level rejections that never
//! reach a handler (415 wrong Content-Type, 400/422 JSON parse errors, 404, 405).
//!
//! Labels are resolved here against the EventEase route table, so per-event
//! URLs share one series and unrouted paths collapse to `/other`.

use axum::{extract::Request, http::Method, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

const STATIC_ROUTES: &[&str] = &[
    "/health",
    "/metrics",
    "/api/v1/users",
    "/api/v1/login",
    "/api/v1/me",
    "/api/v1/me/events",
    "/api/v1/me/attending",
    "/api/v1/events",
];

const EVENT_ACTIONS: &[&str] = &["join", "leave", "attendance"];

/// Records method, route label, status code and duration for each request.
///
/// Applied as the outermost layer.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = method_label(request.method());
    let endpoint = endpoint_label(request.uri().path());

    let response = next.run(request).await;

    record_http_request(method, endpoint, response.status().as_u16(), start.elapsed());

    response
}

fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

/// Map a request path onto the route it would match.
fn endpoint_label(path: &str) -> String {
    if STATIC_ROUTES.contains(&path) {
        return path.to_string();
    }

    let Some(rest) = path.strip_prefix("/api/v1/events/") else {
        return "/other".to_string();
    };

    let mut segments = rest.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(id), None, None) if !id.is_empty() => "/api/v1/events/{id}".to_string(),
        (Some(id), Some(action), None) if !id.is_empty() && EVENT_ACTIONS.contains(&action) => {
            format!("/api/v1/events/{{id}}/{action}")
        }
        _ => "/other".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::{get, post},
        Router,
    };
    use metrics_util::debugging::DebuggingRecorder;
    use tower::ServiceExt;

    async fn handler_200() -> &'static str {
        "OK"
    }

    async fn handler_500() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/health", get(handler_200))
            .route("/error", get(handler_500))
            .route("/api/v1/events/:id/join", post(handler_200))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn send(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed");

        test_app()
            .oneshot(request)
            .await
            .expect("request should succeed")
            .status()
    }

    #[tokio::test]
    async fn test_middleware_passes_responses_through() {
        assert_eq!(send("GET", "/health").await, StatusCode::OK);
        assert_eq!(send("GET", "/error").await, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(send("GET", "/nonexistent").await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_endpoint_label_keeps_known_routes() {
        assert_eq!(endpoint_label("/health"), "/health");
        assert_eq!(endpoint_label("/api/v1/me/attending"), "/api/v1/me/attending");
        assert_eq!(endpoint_label("/api/v1/events"), "/api/v1/events");
    }

    #[test]
    fn test_endpoint_label_replaces_event_ids() {
        let id = "0d6f4c1e-8a57-4b8e-9a0c-3f1c9a2b7d44";
        assert_eq!(
            endpoint_label(&format!("/api/v1/events/{id}")),
            "/api/v1/events/{id}"
        );
        for action in ["join", "leave", "attendance"] {
            assert_eq!(
                endpoint_label(&format!("/api/v1/events/{id}/{action}")),
                format!("/api/v1/events/{{id}}/{action}")
            );
        }
    }

    #[test]
    fn test_endpoint_label_collapses_unrouted_paths() {
        assert_eq!(endpoint_label("/api/v1/events/x/delete-all"), "/other");
        assert_eq!(endpoint_label("/api/v1/events/x/join/extra"), "/other");
        assert_eq!(endpoint_label("/api/v1/events/"), "/other");
        assert_eq!(endpoint_label("/api/v1/events//join"), "/other");
        assert_eq!(endpoint_label("/wp-admin"), "/other");
    }

    #[test]
    fn test_method_label_is_bounded() {
        assert_eq!(method_label(&Method::DELETE), "DELETE");
        assert_eq!(method_label(&Method::from_bytes(b"PURGE").unwrap()), "OTHER");
    }

    #[test]
    fn test_requests_for_different_events_share_one_series() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                for id in ["a1", "b2", "c3"] {
                    let status = send("POST", &format!("/api/v1/events/{id}/join")).await;
                    assert_eq!(status, StatusCode::OK);
                }
            });
        });

        let endpoints: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| key.key().name() == "eventease_http_requests_total")
            .flat_map(|(key, _, _, _)| {
                key.key()
                    .labels()
                    .filter(|label| label.key() == "endpoint")
                    .map(|label| label.value().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();

        assert_eq!(endpoints, vec!["/api/v1/events/{id}/join".to_string()]);
    }
}
