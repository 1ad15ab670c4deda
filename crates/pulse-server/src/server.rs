use std::net::SocketAddr;

use axum::{Router, routing::get};
use pulse_metrics::MetricRegistry;
use tower::ServiceBuilder;

use crate::handlers::{
    health::health_check,
    metrics::metrics_handler,
    pages::{dummy, home},
    proxy::{call_endpoint, google},
};
use crate::metrics::{HttpMetrics, RequestMetricsLayer};
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::state::AppState;

/// Creates the application router.
///
/// Every route, `/metrics` included, goes through the request metrics layer.
pub fn create_router(state: AppState, registry: MetricRegistry, http_metrics: HttpMetrics) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    // Router for metrics endpoint (different state)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    // Main application router
    let app_router = Router::new()
        .route("/", get(home))
        .route("/dummy", get(dummy))
        .route("/health", get(health_check))
        // Proxy routes
        .route("/google", get(google))
        .route("/call-endpoint", get(call_endpoint))
        .with_state(state);

    // Merge routers and apply middleware
    Router::new()
        .merge(app_router)
        .merge(metrics_router)
        .layer(RequestMetricsLayer::new(http_metrics))
        .layer(middleware_stack)
}

/// Runs the server until Ctrl+C or SIGTERM.
pub async fn run_server(addr: SocketAddr, app: Router) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server is running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
