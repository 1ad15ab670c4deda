//! Metrics setup and initialization.

use std::time::Duration;

use pulse_metrics::{MetricRegistry, MetricsError};
use tokio::task::JoinHandle;
use tracing::info;

use super::http::{HttpMetrics, REQUEST_DURATION};
use crate::settings::MetricsSettings;

/// Intervalo entre pasadas de mantenimiento del registry.
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Inicializa el registry y las metricas HTTP.
///
/// Errors here are configuration errors and should abort startup.
pub fn init_metrics(
    settings: &MetricsSettings,
) -> Result<(MetricRegistry, HttpMetrics), MetricsError> {
    let registry = MetricRegistry::builder()
        .quantiles(&settings.quantiles)?
        .histogram_buckets(REQUEST_DURATION, &settings.buckets)?
        .build();

    if settings.process_metrics {
        registry.collect_defaults()?;
    }

    let http = HttpMetrics::register(&registry, settings.count_request_start)?;

    info!(
        metrics = ?registry.names(),
        count_request_start = settings.count_request_start,
        "Metrics system initialized"
    );
    Ok((registry, http))
}

/// Drains distribution buffers periodically so they stay bounded between scrapes.
pub fn spawn_upkeep(registry: MetricRegistry, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.run_upkeep();
        }
    })
}
