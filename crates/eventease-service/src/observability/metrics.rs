//! Metrics definitions for the EventEase service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `eventease_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP verbs
//! - `endpoint`: parameterized paths, unknown paths collapse to `/other`
//! - `operation`: join, leave, is_attending, list_for_user
//! - `result`: bounded by code (success, not_found, already_joined, ...)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle used
/// by the `/metrics` endpoint.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("eventease_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("eventease_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// `method` and `endpoint` must already be bounded labels; see
/// [`crate::middleware::http_metrics`].
///
/// Metric: `eventease_http_requests_total`, `eventease_http_request_duration_seconds`
pub fn record_http_request(
    method: &'static str,
    endpoint: String,
    status_code: u16,
    duration: Duration,
) {
    let status = categorize_status_code(status_code);

    histogram!("eventease_http_request_duration_seconds",
        "method" => method,
        "endpoint" => endpoint.clone(),
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("eventease_http_requests_total",
        "method" => method,
        "endpoint" => endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record a durable store query.
///
/// Metric: `eventease_db_queries_total`, `eventease_db_query_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("eventease_db_query_duration_seconds",
        "operation" => operation,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("eventease_db_queries_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Domain Metrics
// ============================================================================

/// Record an attendance ledger operation outcome.
///
/// Metric: `eventease_attendance_operations_total`
/// Labels: `operation`, `result`
pub fn record_attendance_operation(operation: &'static str, result: &'static str) {
    counter!("eventease_attendance_operations_total",
        "operation" => operation,
        "result" => result
    )
    .increment(1);
}

/// Record a bearer token verification outcome.
///
/// Metric: `eventease_token_validations_total`
/// Labels: `result` (success, expired, malformed)
pub fn record_token_validation(result: &'static str) {
    counter!("eventease_token_validations_total", "result" => result).increment(1);
}

/// Set the storage degraded gauge: 1 while the transient store is bound.
///
/// Metric: `eventease_storage_degraded`
pub fn set_storage_degraded(degraded: bool) {
    gauge!("eventease_storage_degraded").set(if degraded { 1.0 } else { 0.0 });
}
