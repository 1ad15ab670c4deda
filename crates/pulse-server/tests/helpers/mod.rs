//! Test helpers para pulse-server.

#![allow(dead_code, unused_imports)]

pub mod client;
pub mod exposition;
pub mod upstream;

pub use client::{TestApp, TestClient, TestResponse, app, app_with, client};
pub use exposition::{metric_value, samples};
pub use upstream::MockUpstream;
