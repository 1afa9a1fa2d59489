//! Request spans for the tracing subscriber and OTLP export.
//!
//! One `flow_request` span per HTTP call. What the call became is read from
//! the [`FlowOutcome`] response extension and recorded as `flow.kind`,
//! `flow.screen` and `flow.failure`, so a 421 key refresh and a SUCCESS
//! screen are told apart without decrypting anything.

use crate::domain::FlowOutcome;
use axum::{
    http::{HeaderMap, Request},
    response::Response,
};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{field::Empty, info_span, Instrument, Span};

/// Layer that opens a `flow_request` span per call.
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    /// New layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

/// Service produced by [`TracingLayer`].
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for TracingService<S>
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

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let mut inner = self.inner.clone();

        let span = info_span!(
            "flow_request",
            http.method = %req.method(),
            http.route = %req.uri().path(),
            http.status_code = Empty,
            flow.kind = Empty,
            flow.screen = Empty,
            flow.failure = Empty,
            trace.remote_id = Empty,
            trace.parent_id = Empty,
            trace.sampled = Empty,
            elapsed_ms = Empty,
            otel.kind = "server",
            otel.status_code = Empty,
        );
        if let Some(parent) = TraceParent::from_headers(req.headers()) {
            parent.record(&span);
        }

        Box::pin(
            async move {
                let started = Instant::now();
                let result = inner.call(req).await;

                let span = Span::current();
                span.record("elapsed_ms", started.elapsed().as_millis() as u64);
                match &result {
                    Ok(response) => ResponseFields::from_response(response).record(&span),
                    Err(_) => {
                        span.record("otel.status_code", "ERROR");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Span values taken from a finished response.
#[derive(Debug, PartialEq, Eq)]
struct ResponseFields {
    status: u16,
    otel_status: &'static str,
    outcome: Option<FlowOutcome>,
}

impl ResponseFields {
    fn from_response(response: &Response) -> Self {
        let status = response.status();
        Self {
            status: status.as_u16(),
            // 421 and 432 are routine answers to the platform, not faults
            otel_status: if status.is_server_error() { "ERROR" } else { "OK" },
            outcome: response.extensions().get::<FlowOutcome>().copied(),
        }
    }

    fn record(&self, span: &Span) {
        span.record("http.status_code", self.status);
        span.record("otel.status_code", self.otel_status);

        let Some(outcome) = self.outcome else {
            return;
        };
        span.record("flow.kind", outcome.kind());
        if let Some(screen) = outcome.screen() {
            span.record("flow.screen", screen);
        }
        if let Some(class) = outcome.failure() {
            span.record("flow.failure", class);
        }
    }
}

/// W3C `traceparent`: `version-trace_id-parent_id-flags`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TraceParent {
    trace_id: String,
    parent_id: String,
    sampled: bool,
}

impl TraceParent {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get("traceparent")?.to_str().ok()?;
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let parent_id = parts.next()?;
        let flags = parts.next()?;

        if parts.next().is_some()
            || !is_hex(version, 2)
            || version == "ff"
            || !is_hex(trace_id, 32)
            || !is_hex(parent_id, 16)
            || !is_hex(flags, 2)
        {
            return None;
        }
        // All-zero ids are invalid
        if is_zero(trace_id) || is_zero(parent_id) {
            return None;
        }

        let flags = u8::from_str_radix(flags, 16).ok()?;
        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            parent_id: parent_id.to_ascii_lowercase(),
            sampled: flags & 0x01 == 0x01,
        })
    }

    fn record(&self, span: &Span) {
        span.record("trace.remote_id", self.trace_id.as_str());
        span.record("trace.parent_id", self.parent_id.as_str());
        span.record("trace.sampled", self.sampled);
    }
}

fn is_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FlowError;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use bf_01_envelope_codec::CodecError;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    fn headers(traceparent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", traceparent.parse().unwrap());
        headers
    }

    #[test]
    fn test_traceparent_parsing() {
        let parent =
            TraceParent::from_headers(&headers("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"))
                .unwrap();
        assert_eq!(parent.trace_id, "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(parent.parent_id, "b7ad6b7169203331");
        assert!(parent.sampled);

        let unsampled =
            TraceParent::from_headers(&headers("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-00"))
                .unwrap();
        assert!(!unsampled.sampled);
    }

    #[test]
    fn test_invalid_traceparent() {
        for value in [
            "00-abc-def-01",
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331",
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01-extra",
            "00-0af7651916cd43dd8448eb211c80319z-b7ad6b7169203331-01",
            "00-00000000000000000000000000000000-b7ad6b7169203331-01",
            "00-0af7651916cd43dd8448eb211c80319c-0000000000000000-01",
            "ff-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
        ] {
            assert!(TraceParent::from_headers(&headers(value)).is_none(), "{value}");
        }
        assert!(TraceParent::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_screen_outcome_fields() {
        let mut response = StatusCode::OK.into_response();
        response
            .extensions_mut()
            .insert(FlowOutcome::Screen("SUCCESS"));

        assert_eq!(
            ResponseFields::from_response(&response),
            ResponseFields {
                status: 200,
                otel_status: "OK",
                outcome: Some(FlowOutcome::Screen("SUCCESS")),
            }
        );
    }

    #[test]
    fn test_key_refresh_is_not_a_span_error() {
        let response = FlowError::from(CodecError::KeyUnwrapFailure("oaep".into())).into_response();
        let fields = ResponseFields::from_response(&response);

        assert_eq!(fields.status, 421);
        assert_eq!(fields.otel_status, "OK");
        assert_eq!(fields.outcome, Some(FlowOutcome::Failed("key_unwrap")));
    }

    #[test]
    fn test_untagged_server_error() {
        let response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        let fields = ResponseFields::from_response(&response);
        assert_eq!(fields.otel_status, "ERROR");
        assert_eq!(fields.outcome, None);
    }

    #[tokio::test]
    async fn test_layer_passes_outcome_through() {
        let svc = TracingLayer::new().layer(service_fn(|_req: Request<Body>| async {
            let mut response = StatusCode::OK.into_response();
            response.extensions_mut().insert(FlowOutcome::ChatEvent);
            Ok::<_, Infallible>(response)
        }));

        let response = svc
            .oneshot(
                Request::builder()
                    .uri("/flow")
                    .header(
                        "traceparent",
                        "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.extensions().get::<FlowOutcome>(),
            Some(&FlowOutcome::ChatEvent)
        );
    }
}
