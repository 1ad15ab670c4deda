//! Downstream doble para tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pulse_server::{Upstream, UpstreamError};
use serde_json::Value;

#[derive(Clone)]
enum Reply {
    Body(Value),
    Status(u16),
    Unreachable,
}

/// Upstream that answers from memory and remembers the URLs it was asked for.
#[derive(Clone)]
pub struct MockUpstream {
    reply: Reply,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    fn with(reply: Reply) -> Self {
        Self {
            reply,
            calls: Arc::default(),
        }
    }

    /// Answers every fetch with `body`.
    pub fn ok(body: Value) -> Self {
        Self::with(Reply::Body(body))
    }

    /// Fails every fetch as if the downstream answered `status`.
    pub fn failing(status: u16) -> Self {
        Self::with(Reply::Status(status))
    }

    /// Fails every fetch before anything reaches the network.
    pub fn unreachable() -> Self {
        Self::with(Reply::Unreachable)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// A real `reqwest` error: the request cannot even be built.
fn request_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("relative URLs are rejected")
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch(&self, url: &str) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(url.to_string());

        match &self.reply {
            Reply::Body(body) => Ok(body.clone()),
            Reply::Status(status) => Err(UpstreamError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Reply::Unreachable => Err(UpstreamError::Request {
                url: url.to_string(),
                source: request_error(),
            }),
        }
    }
}
