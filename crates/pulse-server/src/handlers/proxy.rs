//! Proxy endpoint handlers.

use axum::{Json, extract::State};
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Handler for GET /google.
#[instrument(skip_all, fields(url = %state.google_url()))]
pub async fn google(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let body = state.upstream().fetch(state.google_url()).await?;
    Ok(Json(body))
}

/// Handler for GET /call-endpoint.
#[instrument(skip_all, fields(url = %state.call_endpoint_url()))]
pub async fn call_endpoint(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let body = state.upstream().fetch(state.call_endpoint_url()).await?;
    Ok(Json(body))
}
