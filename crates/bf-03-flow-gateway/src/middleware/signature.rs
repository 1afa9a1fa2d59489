//! Webhook signature check.
//!
//! The platform signs every POST body with the app secret and sends
//! `X-Hub-Signature-256: sha256=<hex hmac>`. When a secret is configured,
//! requests without a matching signature are answered with `432` before
//! any decryption is attempted.

use super::metrics::GatewayMetrics;
use crate::domain::FlowError;
use axum::{
    body::{Body, Bytes, HttpBody},
    http::Request,
    response::{IntoResponse, Response},
    BoxError,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

/// Signature layer
#[derive(Clone)]
pub struct SignatureLayer {
    secret: Option<Arc<[u8]>>,
    max_body_bytes: usize,
    metrics: Arc<GatewayMetrics>,
}

impl SignatureLayer {
    /// Layer checking against `secret`; `None` lets every request through.
    pub fn new(secret: Option<&str>, max_body_bytes: usize, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            secret: secret.map(|s| Arc::from(s.as_bytes())),
            max_body_bytes,
            metrics,
        }
    }
}

impl<S> Layer<S> for SignatureLayer {
    type Service = SignatureService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SignatureService {
            inner,
            secret: self.secret.clone(),
            max_body_bytes: self.max_body_bytes,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Signature service
#[derive(Clone)]
pub struct SignatureService<S> {
    inner: S,
    secret: Option<Arc<[u8]>>,
    max_body_bytes: usize,
    metrics: Arc<GatewayMetrics>,
}

impl<S, B> Service<Request<B>> for SignatureService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
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
        let mut inner = self.inner.clone();
        let req = req.map(Body::new);

        let Some(secret) = self.secret.clone() else {
            return Box::pin(async move { inner.call(req).await });
        };
        let max_body_bytes = self.max_body_bytes;
        let metrics = Arc::clone(&self.metrics);

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = match axum::body::to_bytes(body, max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(error = %e, "Could not buffer body for signature check");
                    return Ok(FlowError::BodyTooLarge.into_response());
                }
            };

            let header = parts
                .headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok());

            if !signature_matches(&secret, &bytes, header) {
                warn!(has_header = header.is_some(), "Webhook signature rejected");
                metrics.record_signature_rejection();
                return Ok(FlowError::SignatureMismatch.into_response());
            }

            inner.call(Request::from_parts(parts, Body::from(bytes))).await
        })
    }
}

/// Check `header` against the HMAC-SHA256 of `body`.
///
/// The comparison runs in constant time over the digest bytes.
pub fn signature_matches(secret: &[u8], body: &[u8], header: Option<&str>) -> bool {
    use subtle::ConstantTimeEq;

    let Some(provided) = header
        .and_then(|h| h.trim().strip_prefix(SIGNATURE_PREFIX))
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    if provided.len() != expected.len() {
        return false;
    }
    expected.as_slice().ct_eq(&provided).into()
}

/// Header value for `body` signed with `secret`.
pub fn sign_body(secret: &[u8], body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length.
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    const SECRET: &[u8] = b"app-secret";

    fn echo_layer(secret: Option<&str>) -> (SignatureLayer, Arc<GatewayMetrics>) {
        let metrics = Arc::new(GatewayMetrics::new());
        (SignatureLayer::new(secret, 1024, Arc::clone(&metrics)), metrics)
    }

    async fn echo(req: Request<Body>) -> Result<Response, Infallible> {
        let body = axum::body::to_bytes(req.into_body(), 1024).await.unwrap();
        Ok((StatusCode::OK, body).into_response())
    }

    #[test]
    fn test_sign_then_verify() {
        let header = sign_body(SECRET, b"{\"a\":1}");
        assert!(header.starts_with("sha256="));
        assert!(signature_matches(SECRET, b"{\"a\":1}", Some(&header)));
    }

    #[test]
    fn test_rejects_wrong_body_and_bad_headers() {
        let header = sign_body(SECRET, b"original");
        assert!(!signature_matches(SECRET, b"tampered", Some(&header)));
        assert!(!signature_matches(SECRET, b"original", None));
        assert!(!signature_matches(SECRET, b"original", Some("sha1=abcd")));
        assert!(!signature_matches(SECRET, b"original", Some("sha256=zz")));
        assert!(!signature_matches(SECRET, b"original", Some("sha256=abcd")));
        assert!(!signature_matches(b"other-secret", b"original", Some(&header)));
    }

    #[tokio::test]
    async fn test_valid_signature_passes_body_through() {
        let (layer, _) = echo_layer(Some("app-secret"));
        let svc = layer.layer(service_fn(echo));

        let req = Request::builder()
            .header(SIGNATURE_HEADER, sign_body(SECRET, b"hello"))
            .body(Body::from("hello"))
            .unwrap();
        let response = svc.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_missing_signature_is_432() {
        let (layer, metrics) = echo_layer(Some("app-secret"));
        let svc = layer.layer(service_fn(echo));

        let req = Request::builder().body(Body::from("hello")).unwrap();
        let response = svc.oneshot(req).await.unwrap();

        assert_eq!(response.status().as_u16(), 432);
        assert_eq!(metrics.to_json()["security"]["signature_rejections"], 1);
    }

    #[tokio::test]
    async fn test_no_secret_skips_check() {
        let (layer, _) = echo_layer(None);
        let svc = layer.layer(service_fn(echo));

        let req = Request::builder().body(Body::from("unsigned")).unwrap();
        let response = svc.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let (layer, _) = echo_layer(Some("app-secret"));
        let svc = layer.layer(service_fn(echo));

        let big = vec![b'x'; 4096];
        let req = Request::builder()
            .header(SIGNATURE_HEADER, sign_body(SECRET, &big))
            .body(Body::from(big))
            .unwrap();
        let response = svc.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
