//! Lectura de valores en el texto de exposicion.

/// Parsed sample: series (name plus label block, as rendered) and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub series: String,
    pub value: f64,
}

/// All sample lines, comments skipped.
pub fn samples(body: &str) -> Vec<Sample> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            Some(Sample {
                series: series.to_string(),
                value: value.parse().ok()?,
            })
        })
        .collect()
}

/// Value of the series rendered exactly as `series`, e.g.
/// `app_total_requests{method="GET",endpoint="/dummy",status="200"}`.
pub fn metric_value(body: &str, series: &str) -> Option<f64> {
    samples(body)
        .into_iter()
        .find(|s| s.series == series)
        .map(|s| s.value)
}
