//! Metrics definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sra_` prefix for this service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: 2 values in practice (GET, HEAD) plus rejected methods
//! - `endpoint`: 4 values (fixed route set)
//! - `status`/`status_code`: handful of values
//!
//! The recorder is installed once at startup and the known status-code
//! counter label sets are registered explicitly, not on first use.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Response statuses the service produces on the validate path.
const KNOWN_STATUS_CODES: &[u16] = &[200, 401, 405, 500];

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics over HTTP.
///
/// Histogram buckets for token validation are aligned with signature
/// verification latency (tens of microseconds to low milliseconds).
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("sra_token_validation_seconds".to_string()),
            &[
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.010, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Full("sra_http_request_duration_seconds".to_string()),
            &[
                0.000_1, 0.000_5, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set request duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Register the status-code counter label sets at process start so the
/// series exist before the first request.
pub fn register_status_counters() {
    for status_code in KNOWN_STATUS_CODES {
        counter!("sra_http_requests_total",
            "status_code" => status_code.to_string()
        )
        .absolute(0);
    }
}

/// Record HTTP request completion.
///
/// Metric: `sra_http_requests_total`, `sra_http_request_duration_seconds`
/// Labels: `status_code` (counter); `method`, `endpoint`, `status`
/// (histogram)
///
/// Captures ALL responses including framework-level ones such as 405
/// Method Not Allowed.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sra_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sra_http_requests_total",
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Record the duration of one token verification step.
///
/// Metric: `sra_token_validation_seconds`
pub fn record_token_validation(duration: Duration) {
    histogram!("sra_token_validation_seconds").record(duration.as_secs_f64());
}

/// Categorize HTTP status code into success/denied/error for simplified
/// querying.
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        401 | 403 => "denied",
        _ => "error",
    }
}

/// Normalize endpoint path to bound label cardinality.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/validate" | "/healthz" | "/metrics" => path.to_string(),
        _ => "/other".to_string(),
    }
}
