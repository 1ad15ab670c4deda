//! Pulse Server binary.

use std::sync::Arc;

use anyhow::Context;
use pulse_server::metrics::{setup::UPKEEP_INTERVAL, spawn_upkeep};
use pulse_server::{AppState, HttpUpstream, Settings, create_router, init_metrics, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.server.addr()?;

    tracing::info!("Starting Pulse Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Google URL: {}", settings.upstream.google_url);
    tracing::info!("Call-endpoint URL: {}", settings.upstream.call_endpoint_url);

    // Registration errors are configuration errors: abort before binding
    let (registry, http_metrics) =
        init_metrics(&settings.metrics).context("failed to initialize metrics")?;
    spawn_upkeep(registry.clone(), UPKEEP_INTERVAL);

    let upstream = HttpUpstream::new(settings.upstream.timeout())
        .context("failed to build downstream client")?;

    // Create application state
    let state = AppState::new(Arc::new(upstream), settings.upstream.clone());

    // Run server
    let app = create_router(state, registry, http_metrics);
    run_server(addr, app).await?;

    Ok(())
}
