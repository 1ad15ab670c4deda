//! The owned metric registry.
//!
//! A [`MetricRegistry`] wraps a Prometheus recorder that is built but never
//! installed as the process-global `metrics` recorder. Instruments are
//! registered through the registry, which rejects duplicate names, and the
//! whole collection is rendered on demand by [`MetricRegistry::serialize`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use metrics::{KeyName, Recorder, SharedString};
use metrics_exporter_prometheus::{
    Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::exposition::canonicalize;
use crate::instruments::{Counter, Gauge, Histogram, Summary};
use crate::process::{Collector, ProcessCollector};

/// Media type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// A rendered scrape: the exposition text and the content type to serve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposition {
    pub body: String,
    pub content_type: &'static str,
}

/// Builder for a [`MetricRegistry`].
///
/// Bucket layouts have to be known before the recorder is built, so every
/// bucketed histogram is declared here by name. Histograms registered later
/// without a declared layout are rejected; distributions without buckets
/// are summaries.
pub struct RegistryBuilder {
    exporter: PrometheusBuilder,
    bucketed: HashSet<String>,
}

impl RegistryBuilder {
    fn new() -> Self {
        Self {
            exporter: PrometheusBuilder::new(),
            bucketed: HashSet::new(),
        }
    }

    /// Sets the quantiles every summary reports.
    pub fn quantiles(self, quantiles: &[f64]) -> Result<Self> {
        if let Some(&q) = quantiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(MetricsError::InvalidQuantile(q));
        }

        Ok(Self {
            exporter: self.exporter.set_quantiles(quantiles)?,
            bucketed: self.bucketed,
        })
    }

    /// Declares the bucket boundaries of the histogram called `name`.
    ///
    /// Boundaries must be finite and strictly increasing; the `+Inf` bucket
    /// is implicit.
    pub fn histogram_buckets(mut self, name: &str, buckets: &[f64]) -> Result<Self> {
        if buckets.is_empty() {
            return Err(MetricsError::invalid_buckets(name, "no boundaries given"));
        }
        if buckets.iter().any(|b| !b.is_finite()) {
            return Err(MetricsError::invalid_buckets(name, "boundaries must be finite"));
        }
        if buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MetricsError::invalid_buckets(
                name,
                "boundaries must be strictly increasing",
            ));
        }

        self.exporter = self
            .exporter
            .set_buckets_for_metric(Matcher::Full(name.to_string()), buckets)?;
        self.bucketed.insert(name.to_string());
        Ok(self)
    }

    /// Builds the registry. The recorder is not installed globally.
    pub fn build(self) -> MetricRegistry {
        let recorder = self.exporter.build_recorder();
        let handle = recorder.handle();

        MetricRegistry {
            inner: Arc::new(Inner {
                recorder: Arc::new(recorder),
                handle,
                bucketed: self.bucketed,
                names: Mutex::new(BTreeSet::new()),
                collectors: Mutex::new(Vec::new()),
            }),
        }
    }
}

struct Inner {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    bucketed: HashSet<String>,
    names: Mutex<BTreeSet<&'static str>>,
    collectors: Mutex<Vec<Box<dyn Collector>>>,
}

/// An owned collection of instruments, rendered on demand.
///
/// Cloning is cheap and every clone refers to the same collection.
#[derive(Clone)]
pub struct MetricRegistry {
    inner: Arc<Inner>,
}

impl MetricRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registers a counter.
    pub fn register_counter<L>(&self, name: &'static str, help: &'static str) -> Result<Counter<L>> {
        self.claim(name)?;
        self.inner
            .recorder
            .describe_counter(KeyName::from(name), None, SharedString::from(help));
        Ok(Counter::new(name, self.inner.recorder.clone()))
    }

    /// Registers a gauge.
    pub fn register_gauge<L>(&self, name: &'static str, help: &'static str) -> Result<Gauge<L>> {
        self.claim(name)?;
        self.inner
            .recorder
            .describe_gauge(KeyName::from(name), None, SharedString::from(help));
        Ok(Gauge::new(name, self.inner.recorder.clone()))
    }

    /// Registers a summary reporting the builder's quantiles.
    ///
    /// A name that was given buckets on the builder is a histogram and cannot
    /// be registered as a summary.
    pub fn register_summary<L>(&self, name: &'static str, help: &'static str) -> Result<Summary<L>> {
        if self.inner.bucketed.contains(name) {
            return Err(MetricsError::invalid_buckets(
                name,
                "bucket layout declared for a summary",
            ));
        }
        self.claim(name)?;
        self.inner
            .recorder
            .describe_histogram(KeyName::from(name), None, SharedString::from(help));
        Ok(Summary::new(name, self.inner.recorder.clone()))
    }

    /// Registers a histogram using the buckets declared for `name`.
    pub fn register_histogram<L>(
        &self,
        name: &'static str,
        help: &'static str,
    ) -> Result<Histogram<L>> {
        if !self.inner.bucketed.contains(name) {
            return Err(MetricsError::MissingBuckets(name.to_string()));
        }
        self.claim(name)?;
        self.inner
            .recorder
            .describe_histogram(KeyName::from(name), None, SharedString::from(help));
        Ok(Histogram::new(name, self.inner.recorder.clone()))
    }

    /// Attaches the default process collector.
    ///
    /// Calling this twice fails with [`MetricsError::DuplicateMetric`].
    pub fn collect_defaults(&self) -> Result<()> {
        let collector = ProcessCollector::register(self)?;
        self.attach(collector);
        Ok(())
    }

    /// Attaches a collector that refreshes its instruments before each scrape.
    pub fn attach(&self, collector: impl Collector + 'static) {
        debug!(collector = collector.name(), "Collector attached");
        self.inner.collectors.lock().push(Box::new(collector));
    }

    /// Returns the registered metric names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.inner.names.lock().iter().copied().collect()
    }

    /// Renders every registered instrument in the text exposition format.
    ///
    /// Collectors run first; if one fails the scrape fails and nothing is
    /// rendered. Families come out sorted by name and series by labels, so
    /// two scrapes with no updates in between are byte-identical. Instrument
    /// updates racing with a scrape land either in this rendering or the
    /// next, never half-way.
    pub fn serialize(&self) -> Result<Exposition> {
        for collector in self.inner.collectors.lock().iter() {
            collector.collect()?;
        }

        Ok(Exposition {
            body: canonicalize(&self.inner.handle.render()),
            content_type: CONTENT_TYPE,
        })
    }

    /// Drains pending distribution samples without rendering.
    ///
    /// Scrapes do this as a side effect; a periodic upkeep keeps memory
    /// bounded when nothing scrapes.
    pub fn run_upkeep(&self) {
        self.inner.handle.run_upkeep();
    }

    fn claim(&self, name: &'static str) -> Result<()> {
        if !is_valid_name(name) {
            return Err(MetricsError::InvalidName(name.to_string()));
        }
        if !self.inner.names.lock().insert(name) {
            return Err(MetricsError::DuplicateMetric(name.to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("names", &*self.inner.names.lock())
            .field("collectors", &self.inner.collectors.lock().len())
            .finish()
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
