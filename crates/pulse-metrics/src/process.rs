//! Process-level collectors.
//!
//! Collectors refresh their instruments right before each scrape instead of
//! being updated on a hot path. The only built-in one reports the usual
//! `process_*` series; on Linux it reads them from `/proc/self` through `procfs`.

use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_os = "linux")]
use crate::error::MetricsError;
use crate::error::Result;
use crate::instruments::Gauge;
use crate::registry::MetricRegistry;

/// Something that refreshes instruments before the registry renders them.
pub trait Collector: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Refreshes the collector's instruments.
    fn collect(&self) -> Result<()>;
}

/// Reports CPU time, memory, file descriptors and start time of this process.
#[derive(Debug)]
pub struct ProcessCollector {
    start_time: Gauge<()>,
    started_at: f64,
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    linux: LinuxGauges,
}

#[derive(Debug)]
struct LinuxGauges {
    // A gauge: counters only take whole numbers and CPU time is fractional.
    cpu_seconds: Gauge<()>,
    resident_memory: Gauge<()>,
    virtual_memory: Gauge<()>,
    open_fds: Gauge<()>,
    max_fds: Gauge<()>,
}

impl ProcessCollector {
    /// Registers the process instruments in `registry`.
    pub fn register(registry: &MetricRegistry) -> Result<Self> {
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        Ok(Self {
            start_time: registry.register_gauge(
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds.",
            )?,
            started_at,
            linux: LinuxGauges {
                cpu_seconds: registry.register_gauge(
                    "process_cpu_seconds_total",
                    "Total user and system CPU time spent in seconds.",
                )?,
                resident_memory: registry.register_gauge(
                    "process_resident_memory_bytes",
                    "Resident memory size in bytes.",
                )?,
                virtual_memory: registry.register_gauge(
                    "process_virtual_memory_bytes",
                    "Virtual memory size in bytes.",
                )?,
                open_fds: registry
                    .register_gauge("process_open_fds", "Number of open file descriptors.")?,
                max_fds: registry.register_gauge(
                    "process_max_fds",
                    "Maximum number of open file descriptors.",
                )?,
            },
        })
    }
}

impl Collector for ProcessCollector {
    fn name(&self) -> &'static str {
        "process"
    }

    fn collect(&self) -> Result<()> {
        #[cfg(target_os = "linux")]
        return self.linux.collect(&self.start_time, self.started_at);

        #[cfg(not(target_os = "linux"))]
        {
            self.start_time.set(&(), self.started_at);
            Ok(())
        }
    }
}

#[cfg(target_os = "linux")]
impl LinuxGauges {
    fn collect(&self, start_time: &Gauge<()>, started_at: f64) -> Result<()> {
        use procfs::process::{LimitValue, Process};

        let process = Process::myself().map_err(collect_error)?;
        let stat = process.stat().map_err(collect_error)?;
        let ticks = procfs::ticks_per_second();

        self.cpu_seconds
            .set(&(), ticks_to_seconds(stat.utime + stat.stime, ticks));
        self.resident_memory
            .set(&(), (stat.rss * procfs::page_size()) as f64);
        self.virtual_memory.set(&(), stat.vsize as f64);

        let started = procfs::boot_time_secs()
            .map(|boot| boot as f64 + ticks_to_seconds(stat.starttime, ticks))
            .unwrap_or(started_at);
        start_time.set(&(), started);

        let open = process.fd_count().map_err(collect_error)?;
        self.open_fds.set(&(), open as f64);

        let limits = process.limits().map_err(collect_error)?;
        if let LimitValue::Value(max) = limits.max_open_files.soft_limit {
            self.max_fds.set(&(), max as f64);
        }

        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn collect_error(source: procfs::ProcError) -> MetricsError {
    MetricsError::Collect {
        collector: "process",
        source: Box::new(source),
    }
}

/// Converts kernel clock ticks to seconds, keeping the fraction.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn ticks_to_seconds(ticks: u64, ticks_per_second: u64) -> f64 {
    if ticks_per_second == 0 {
        return 0.0;
    }
    ticks as f64 / ticks_per_second as f64
}
