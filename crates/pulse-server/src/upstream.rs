//! Downstream HTTP collaborator.
//!
//! The proxy routes make one GET per request and never retry. Any failure,
//! whether connecting, timing out or a non-2xx answer, surfaces as an
//! [`UpstreamError`] that the handler maps to a fixed 500 response.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by an [`Upstream`].
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be sent or timed out.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The downstream answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A downstream service reachable by URL.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches `url` and returns its body as JSON.
    ///
    /// A body that is not JSON is returned as a JSON string.
    async fn fetch(&self, url: &str) -> Result<Value, UpstreamError>;
}

/// [`Upstream`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pulse-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| UpstreamError::Decode {
            url: url.to_string(),
            source,
        })?;

        Ok(body_to_json(body))
    }
}

fn body_to_json(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}
