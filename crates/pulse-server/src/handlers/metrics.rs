//! Metrics endpoint handler.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use pulse_metrics::MetricRegistry;

use crate::error::AppError;

/// Handler para el endpoint /metrics
pub async fn metrics_handler(State(registry): State<MetricRegistry>) -> Result<Response, AppError> {
    let exposition = registry
        .serialize()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, exposition.content_type)], exposition.body).into_response())
}
