//! Metrics module for the pulse server.

pub mod http;
pub mod setup;

pub use http::{HttpMetrics, RequestMetricsLayer};
pub use setup::{init_metrics, spawn_upkeep};
