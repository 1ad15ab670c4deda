//! Pulse Server - instrumented HTTP relay
//!
//! Serves a few static and proxied routes and exposes request metrics for
//! Prometheus on `/metrics`.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;
pub mod upstream;

pub use error::{AppError, MessageResponse};
pub use handlers::health::HealthResponse;
pub use metrics::{HttpMetrics, RequestMetricsLayer, init_metrics};
pub use server::{create_router, run_server};
pub use settings::Settings;
pub use state::AppState;
pub use upstream::{HttpUpstream, Upstream, UpstreamError};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
