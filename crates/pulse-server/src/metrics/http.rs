//! HTTP request metrics middleware.
//!
//! Every request moves through two states. On entry, synchronously and
//! before the inner service runs, both duration timers start and the
//! in-flight gauge and the request counter are bumped under
//! `{method, endpoint}`. On completion, the gauge is decremented with the
//! same tuple and the status-bearing counter and both distributions are
//! recorded under `{method, endpoint, status}`.
//!
//! Completion is driven by an [`InFlight`] guard that travels inside the
//! response body, so it fires when the body has been streamed to the end,
//! not when the handler returns. Dropping the guard completes it as well,
//! which covers aborted connections and cancelled handlers; completion
//! therefore happens exactly once per request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    extract::MatchedPath,
    http::{Method, Request, Response, StatusCode},
};
use http_body::{Body as HttpBody, Frame, SizeHint};
use pulse_metrics::{
    Counter, Gauge, Histogram, Label, LabelSet, MetricRegistry, MetricsError, Summary, Timer,
};
use tower::{Layer, Service};

pub const ACTIVE_REQUESTS: &str = "active_requests";
pub const TOTAL_REQUESTS: &str = "app_total_requests";
pub const REQUEST_DURATION: &str = "app_request_duration_seconds";
pub const REQUEST_DURATION_SUMMARY: &str = "app_request_duration_summary_seconds";

/// `{method, endpoint}`, fixed when the request enters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteLabels {
    pub method: Method,
    pub endpoint: Arc<str>,
}

impl RouteLabels {
    pub fn new(method: Method, endpoint: impl Into<Arc<str>>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
        }
    }

    /// Uses the matched route template, or the raw path when nothing matched.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let endpoint = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str())
            .unwrap_or_else(|| request.uri().path());

        Self::new(request.method().clone(), endpoint)
    }

    pub fn with_status(&self, status: StatusCode) -> StatusLabels {
        StatusLabels {
            route: self.clone(),
            status,
        }
    }
}

impl LabelSet for RouteLabels {
    fn labels(&self) -> Vec<Label> {
        vec![
            Label::new("method", self.method.as_str().to_owned()),
            Label::new("endpoint", self.endpoint.to_string()),
        ]
    }
}

/// `{method, endpoint, status}`, known once the response exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusLabels {
    pub route: RouteLabels,
    pub status: StatusCode,
}

impl LabelSet for StatusLabels {
    fn labels(&self) -> Vec<Label> {
        let mut labels = self.route.labels();
        labels.push(Label::new("status", self.status.as_u16().to_string()));
        labels
    }
}

/// Labels of the request counter: the status is absent on the start tally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestLabels {
    Started(RouteLabels),
    Finished(StatusLabels),
}

impl LabelSet for RequestLabels {
    fn labels(&self) -> Vec<Label> {
        match self {
            Self::Started(route) => route.labels(),
            Self::Finished(status) => status.labels(),
        }
    }
}

/// The request instruments.
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    active: Gauge<RouteLabels>,
    total: Counter<RequestLabels>,
    duration_summary: Summary<StatusLabels>,
    duration_histogram: Histogram<StatusLabels>,
    count_request_start: bool,
}

impl HttpMetrics {
    /// Registra las metricas HTTP.
    ///
    /// The registry must have buckets declared for [`REQUEST_DURATION`].
    pub fn register(
        registry: &MetricRegistry,
        count_request_start: bool,
    ) -> Result<Self, MetricsError> {
        Ok(Self {
            active: registry.register_gauge(ACTIVE_REQUESTS, "Number of active requests")?,
            total: registry.register_counter(TOTAL_REQUESTS, "Total number of requests")?,
            duration_summary: registry.register_summary(
                REQUEST_DURATION_SUMMARY,
                "Request duration quantiles in seconds",
            )?,
            duration_histogram: registry
                .register_histogram(REQUEST_DURATION, "Request duration in seconds")?,
            count_request_start,
        })
    }

    /// Records the entry of a request and returns the guard completing it.
    pub fn enter(self: &Arc<Self>, route: RouteLabels) -> InFlight {
        let histogram_timer = self.duration_histogram.start_timer();
        let summary_timer = self.duration_summary.start_timer();

        self.active.inc(&route);
        if self.count_request_start {
            self.total.inc(&RequestLabels::Started(route.clone()));
        }

        InFlight {
            metrics: Arc::clone(self),
            route,
            status: None,
            timers: Some((histogram_timer, summary_timer)),
        }
    }
}

/// A request between entry and completion.
///
/// Completion runs when the guard is dropped. Without a status (the handler
/// never produced a response) only the gauge is released.
#[derive(Debug)]
pub struct InFlight {
    metrics: Arc<HttpMetrics>,
    route: RouteLabels,
    status: Option<StatusCode>,
    timers: Option<(
        Timer<Histogram<StatusLabels>>,
        Timer<Summary<StatusLabels>>,
    )>,
}

impl InFlight {
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Completes the request now.
    pub fn finish(self) {}
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let metrics = &self.metrics;
        metrics.active.dec(&self.route);

        let Some(status) = self.status else {
            tracing::debug!(
                method = %self.route.method,
                endpoint = %self.route.endpoint,
                "Request dropped before a response was produced"
            );
            return;
        };

        let labels = self.route.with_status(status);
        metrics.total.inc(&RequestLabels::Finished(labels.clone()));
        if let Some((histogram_timer, summary_timer)) = self.timers.take() {
            histogram_timer.observe_duration(&labels);
            summary_timer.observe_duration(&labels);
        }
    }
}

/// Response body that completes its request once fully streamed.
pub struct MetricsBody {
    inner: Body,
    in_flight: Option<InFlight>,
}

impl MetricsBody {
    pub fn new(inner: Body, in_flight: InFlight) -> Self {
        Self {
            inner,
            in_flight: Some(in_flight),
        }
    }
}

impl HttpBody for MetricsBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        let done = match &polled {
            Poll::Ready(Some(Ok(_))) => this.inner.is_end_stream(),
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => true,
            Poll::Pending => false,
        };
        if done {
            if let Some(in_flight) = this.in_flight.take() {
                in_flight.finish();
            }
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Layer that records [`HttpMetrics`] for every request.
#[derive(Debug, Clone)]
pub struct RequestMetricsLayer {
    metrics: Arc<HttpMetrics>,
}

impl RequestMetricsLayer {
    pub fn new(metrics: HttpMetrics) -> Self {
        Self {
            metrics: Arc::new(metrics),
        }
    }
}

impl<S> Layer<S> for RequestMetricsLayer {
    type Service = RequestMetrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestMetrics {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Middleware that records request metrics.
#[derive(Debug, Clone)]
pub struct RequestMetrics<S> {
    inner: S,
    metrics: Arc<HttpMetrics>,
}

impl<S> Service<Request<Body>> for RequestMetrics<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let mut in_flight = self.metrics.enter(RouteLabels::from_request(&request));

        // The ready service is the one that has to be called.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let future = inner.call(request);

        Box::pin(async move {
            let response = future.await?;
            in_flight.set_status(response.status());

            Ok(response.map(|body| Body::new(MetricsBody::new(body, in_flight))))
        })
    }
}
