//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated so Prometheus can scrape. Only operational data with
//! bounded-cardinality labels is exposed; no claim values or tokens.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics.
///
/// Returns Prometheus-formatted metrics for scraping.
#[tracing::instrument(skip_all, name = "sra.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

#[cfg(test)]
mod tests {
    // Testing this endpoint requires a PrometheusHandle, which can only be
    // installed once per process via PrometheusBuilder. The full endpoint
    // is exercised by the integration tests in validate_tests.rs.
}
