//! Error types for the metric registry.
//!
//! Every failure here is a configuration problem that shows up while the
//! registry is being assembled at startup, except [`MetricsError::Collect`],
//! which can happen on any scrape when a collector cannot read its source.

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

/// Errors raised while building, populating or serializing a registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// An instrument with the same name is already registered.
    #[error("metric '{0}' is already registered")]
    DuplicateMetric(String),

    /// The metric name is not a valid Prometheus metric name.
    #[error("invalid metric name '{0}'")]
    InvalidName(String),

    /// A histogram was registered without a bucket layout.
    #[error("histogram '{0}' has no bucket layout; declare it on the registry builder")]
    MissingBuckets(String),

    /// Bucket boundaries are empty, not finite or not strictly increasing.
    #[error("invalid buckets for '{name}': {reason}")]
    InvalidBuckets {
        /// Histogram the buckets were declared for
        name: String,
        /// What is wrong with them
        reason: String,
    },

    /// A summary quantile lies outside `[0, 1]`.
    #[error("invalid quantile {0}: must be within [0, 1]")]
    InvalidQuantile(f64),

    /// The underlying Prometheus exporter rejected its configuration.
    #[error("exporter configuration rejected: {0}")]
    Build(#[from] BuildError),

    /// A collector failed to read its source during serialization.
    #[error("collector '{collector}' failed: {source}")]
    Collect {
        /// Name of the failing collector
        collector: &'static str,
        /// Underlying read failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MetricsError {
    /// Creates a new bucket validation error.
    pub fn invalid_buckets(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBuckets {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error was raised while assembling the registry.
    ///
    /// Such errors are fatal at startup; collector errors only fail the
    /// scrape that hit them.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Collect { .. })
    }
}

/// Convenience alias for registry results.
pub type Result<T> = std::result::Result<T, MetricsError>;
