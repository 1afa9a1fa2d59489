//! Middleware stack for the Flow Gateway.
//!
//! Layer order: Request → BodyLimit → Tracing → Timeout → Handler, with the
//! signature check wrapped around `POST /flow` only.

pub mod metrics;
pub mod signature;
pub mod timeout;
pub mod tracing;

pub use metrics::{GatewayMetrics, RequestTimer};
pub use signature::{sign_body, signature_matches, SignatureLayer, SIGNATURE_HEADER};
pub use timeout::TimeoutLayer;
pub use tracing::TracingLayer;
