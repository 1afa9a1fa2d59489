//! Whole-request timeout.
//!
//! The dispatcher bounds each collaborator call on its own; this layer caps
//! the request end to end so a stuck exchange cannot hold a connection.

use super::metrics::GatewayMetrics;
use crate::domain::FlowOutcome;
use axum::{
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

/// Timeout layer
#[derive(Clone)]
pub struct TimeoutLayer {
    duration: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl TimeoutLayer {
    /// Layer that answers `504` after `duration`.
    pub fn new(duration: Duration, metrics: Arc<GatewayMetrics>) -> Self {
        Self { duration, metrics }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            duration: self.duration,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Timeout service
#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    duration: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl<S, B> Service<Request<B>> for TimeoutService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let duration = self.duration;
        let metrics = Arc::clone(&self.metrics);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match timeout(duration, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = duration.as_millis() as u64, "Request timed out");
                    metrics.record_timeout();
                    Ok(timeout_response())
                }
            }
        })
    }
}

fn timeout_response() -> Response {
    let mut response = (
        StatusCode::GATEWAY_TIMEOUT,
        [(header::CONTENT_TYPE, "text/plain")],
        "Request timed out",
    )
        .into_response();
    response
        .extensions_mut()
        .insert(FlowOutcome::Failed("timeout"));
    response
}
