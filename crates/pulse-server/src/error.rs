use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::upstream::UpstreamError;

/// Mensaje fijo para cualquier fallo del servicio downstream.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to call endpoint";

#[derive(Debug)]
pub enum AppError {
    /// El servicio downstream fallo (red, timeout o status no exitoso)
    Upstream(UpstreamError),

    /// Error interno
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::Upstream(err) => {
                tracing::warn!(error = %err, "Downstream call failed");
                UPSTREAM_FAILURE_MESSAGE.to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                msg
            }
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse::new(message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_use_the_fixed_message() {
        let err = AppError::from(UpstreamError::Status {
            url: "http://app-2.retail-store".to_string(),
            status: 502,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn message_response_serializes_correctly() {
        let json = serde_json::to_string(&MessageResponse::new(UPSTREAM_FAILURE_MESSAGE)).unwrap();
        assert_eq!(json, r#"{"message":"Failed to call endpoint"}"#);
    }
}
