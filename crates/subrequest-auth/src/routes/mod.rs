//! HTTP routes and application state.

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics::http_metrics_middleware;
use crate::pattern_cache::PatternCache;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token verifier with its key resolver.
    pub verifier: TokenVerifier,

    /// Shared compiled-pattern cache.
    pub patterns: PatternCache,
}

/// Build the application routes.
///
/// - `/validate` - subrequest validation (GET/HEAD; other methods get 405)
/// - `/healthz` - liveness probe
/// - `/metrics` - Prometheus exposition
///
/// Request flow through the layers: http-metrics (counts every response,
/// including 405s and recovered panics), catch-panic (unexpected failures
/// become plain 500s), trace, then a 30 second timeout.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .route("/validate", get(handlers::validate))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(http_metrics_middleware))
}
