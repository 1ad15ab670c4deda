//! Pulse Metrics - owned metric registry and typed instruments
//!
//! This crate provides the instruments the pulse relay records request
//! metrics with, and the registry that renders them in the Prometheus text
//! exposition format.
//!
//! Unlike the usual `metrics` setup, nothing here installs a global recorder:
//! a [`MetricRegistry`] is an explicit value that owns its recorder, so every
//! caller (and every test) decides which registry an instrument lives in.
//!
//! # Example
//!
//! ```
//! use pulse_metrics::{Label, LabelSet, MetricRegistry};
//!
//! struct Route(&'static str);
//!
//! impl LabelSet for Route {
//!     fn labels(&self) -> Vec<Label> {
//!         vec![Label::new("endpoint", self.0)]
//!     }
//! }
//!
//! let registry = MetricRegistry::builder().build();
//! let hits = registry
//!     .register_counter::<Route>("hits_total", "Hits per endpoint")
//!     .unwrap();
//!
//! hits.inc(&Route("/"));
//!
//! let exposition = registry.serialize().unwrap();
//! assert!(exposition.body.contains(r#"hits_total{endpoint="/"} 1"#));
//! ```

pub mod error;
mod exposition;
pub mod instruments;
pub mod labels;
pub mod process;
pub mod registry;

pub use error::{MetricsError, Result};
pub use instruments::{Counter, Gauge, Histogram, Observe, Summary, Timer};
pub use labels::LabelSet;
pub use metrics::Label;
pub use process::{Collector, ProcessCollector};
pub use registry::{CONTENT_TYPE, Exposition, MetricRegistry, RegistryBuilder};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
