//! Subrequest Auth Service
//!
//! Entry point: initializes tracing and metrics, loads configuration,
//! builds the key resolver (failing fast without a usable key source), and
//! serves the validation API.

use std::net::SocketAddr;
use std::sync::Arc;
use subrequest_auth::auth::{KeyResolver, TokenVerifier};
use subrequest_auth::config::Config;
use subrequest_auth::observability::metrics::{init_metrics_recorder, register_status_counters};
use subrequest_auth::pattern_cache::PatternCache;
use subrequest_auth::routes::{self, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subrequest_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting subrequest auth service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        key_file = config.jwks_path.as_deref().unwrap_or("<none>"),
        jwks_url = config.jwks_url.as_deref().unwrap_or("<none>"),
        jwks_refresh_seconds = config.jwks_refresh.as_secs(),
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;
    register_status_counters();

    // Fatal if the key file is unusable or the initial JWKS fetch fails
    let resolver = KeyResolver::from_config(&config).await.map_err(|e| {
        error!("Failed to initialize key resolver: {}", e);
        e
    })?;
    let _refresh_task = resolver.spawn_refresh(config.jwks_refresh);

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState {
        config,
        verifier: TokenVerifier::new(resolver),
        patterns: PatternCache::new(),
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Subrequest auth service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Subrequest auth service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
