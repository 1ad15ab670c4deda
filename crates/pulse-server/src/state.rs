//! Application state.

use std::sync::Arc;

use crate::settings::UpstreamSettings;
use crate::upstream::Upstream;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The downstream client.
    upstream: Arc<dyn Upstream>,
    targets: Arc<UpstreamSettings>,
}

impl AppState {
    /// Creates a new AppState with the given downstream client and targets.
    pub fn new(upstream: Arc<dyn Upstream>, targets: UpstreamSettings) -> Self {
        Self {
            upstream,
            targets: Arc::new(targets),
        }
    }

    /// Returns a reference to the downstream client.
    pub fn upstream(&self) -> &dyn Upstream {
        self.upstream.as_ref()
    }

    /// URL proxied by `/google`.
    pub fn google_url(&self) -> &str {
        &self.targets.google_url
    }

    /// URL proxied by `/call-endpoint`.
    pub fn call_endpoint_url(&self) -> &str {
        &self.targets.call_endpoint_url
    }
}
