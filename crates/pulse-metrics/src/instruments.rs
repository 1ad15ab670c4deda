//! Typed instruments backed by the registry's Prometheus recorder.
//!
//! Each instrument is a thin handle: the per-series state (atomic counters,
//! gauges and distribution buffers) lives in the recorder, which creates a
//! zeroed series the first time a label tuple is seen. Handles are cheap to
//! clone and safe to share across threads.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{Key, Level, Metadata, Recorder};
use metrics_exporter_prometheus::PrometheusRecorder;

use crate::labels::LabelSet;

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Name and recorder shared by every instrument kind.
#[derive(Clone)]
struct Series {
    name: &'static str,
    recorder: Arc<PrometheusRecorder>,
}

impl Series {
    fn key<L: LabelSet>(&self, labels: &L) -> Key {
        Key::from_parts(self.name, labels.labels())
    }

    fn counter<L: LabelSet>(&self, labels: &L) -> metrics::Counter {
        self.recorder.register_counter(&self.key(labels), &METADATA)
    }

    fn gauge<L: LabelSet>(&self, labels: &L) -> metrics::Gauge {
        self.recorder.register_gauge(&self.key(labels), &METADATA)
    }

    fn histogram<L: LabelSet>(&self, labels: &L) -> metrics::Histogram {
        self.recorder.register_histogram(&self.key(labels), &METADATA)
    }
}

macro_rules! instrument {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        pub struct $ty<L> {
            series: Series,
            _labels: PhantomData<fn(&L)>,
        }

        impl<L> $ty<L> {
            pub(crate) fn new(name: &'static str, recorder: Arc<PrometheusRecorder>) -> Self {
                Self {
                    series: Series { name, recorder },
                    _labels: PhantomData,
                }
            }

            /// Returns the metric name.
            pub fn name(&self) -> &'static str {
                self.series.name
            }
        }

        impl<L> Clone for $ty<L> {
            fn clone(&self) -> Self {
                Self {
                    series: self.series.clone(),
                    _labels: PhantomData,
                }
            }
        }

        impl<L> fmt::Debug for $ty<L> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("name", &self.series.name)
                    .finish()
            }
        }
    };
}

instrument!(
    /// A value that only goes up.
    ///
    /// Amounts are unsigned, so a negative increment cannot be expressed.
    Counter
);

instrument!(
    /// A value that can go up and down, such as the number of requests in
    /// flight.
    Gauge
);

instrument!(
    /// Streaming quantile estimates over observed values.
    ///
    /// The quantiles reported are the ones configured on the registry
    /// builder.
    Summary
);

instrument!(
    /// Observations counted into fixed buckets, plus a running sum.
    ///
    /// Buckets are declared on the registry builder under this histogram's
    /// name; the exposition reports them cumulatively with a `+Inf` bucket.
    Histogram
);

impl<L: LabelSet> Counter<L> {
    /// Adds one to the series identified by `labels`.
    pub fn inc(&self, labels: &L) {
        self.inc_by(labels, 1);
    }

    /// Adds `amount` to the series identified by `labels`.
    pub fn inc_by(&self, labels: &L, amount: u64) {
        self.series.counter(labels).increment(amount);
    }

    /// Raises the series to `value` if it is higher than the current total.
    ///
    /// Used by collectors mirroring a counter kept elsewhere (the kernel's
    /// CPU accounting, for instance).
    pub(crate) fn absolute(&self, labels: &L, value: u64) {
        self.series.counter(labels).absolute(value);
    }
}

impl<L: LabelSet> Gauge<L> {
    /// Adds one to the series identified by `labels`.
    pub fn inc(&self, labels: &L) {
        self.add(labels, 1.0);
    }

    /// Subtracts one from the series identified by `labels`.
    pub fn dec(&self, labels: &L) {
        self.sub(labels, 1.0);
    }

    /// Adds an arbitrary delta.
    pub fn add(&self, labels: &L, delta: f64) {
        self.series.gauge(labels).increment(delta);
    }

    /// Subtracts an arbitrary delta.
    pub fn sub(&self, labels: &L, delta: f64) {
        self.series.gauge(labels).decrement(delta);
    }

    /// Overwrites the series with `value`.
    pub fn set(&self, labels: &L, value: f64) {
        self.series.gauge(labels).set(value);
    }
}

/// Instruments that accept individual observations.
pub trait Observe<L> {
    /// Records one observation for the series identified by `labels`.
    fn observe(&self, labels: &L, value: f64);
}

impl<L: LabelSet> Observe<L> for Summary<L> {
    fn observe(&self, labels: &L, value: f64) {
        self.series.histogram(labels).record(value);
    }
}

impl<L: LabelSet> Observe<L> for Histogram<L> {
    fn observe(&self, labels: &L, value: f64) {
        self.series.histogram(labels).record(value);
    }
}

impl<L: LabelSet> Summary<L> {
    /// Records one observation.
    pub fn observe(&self, labels: &L, value: f64) {
        Observe::observe(self, labels, value);
    }

    /// Starts a timer that records into this summary.
    pub fn start_timer(&self) -> Timer<Self> {
        Timer::start(self.clone())
    }
}

impl<L: LabelSet> Histogram<L> {
    /// Records one observation.
    pub fn observe(&self, labels: &L, value: f64) {
        Observe::observe(self, labels, value);
    }

    /// Starts a timer that records into this histogram.
    pub fn start_timer(&self) -> Timer<Self> {
        Timer::start(self.clone())
    }
}

/// Measures wall time from its creation until it is observed into the
/// instrument it was started from.
///
/// The labels are supplied when the timer is stopped, because the final
/// labels (the response status, typically) are not known when it starts.
#[derive(Debug, Clone)]
#[must_use = "a timer records nothing until it is observed"]
pub struct Timer<O> {
    target: O,
    start: Instant,
}

impl<O> Timer<O> {
    /// Starts a timer now, recording into `target` once stopped.
    pub fn start(target: O) -> Self {
        Self {
            target,
            start: Instant::now(),
        }
    }

    /// Returns the time elapsed so far without stopping the timer.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stops the timer and records the elapsed seconds under `labels`.
    pub fn observe_duration<L>(self, labels: &L) -> Duration
    where
        O: Observe<L>,
    {
        let elapsed = self.start.elapsed();
        self.target.observe(labels, elapsed.as_secs_f64());
        elapsed
    }
}
