//! # BF-03 Flow Gateway
//!
//! HTTP endpoint the messaging platform calls for every flow screen
//! transition.
//!
//! **Subsystem ID:** 03  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Request Path
//!
//! ```text
//! POST /flow
//!   │
//!   ├─ BodyLimit → Tracing → Timeout → Signature (X-Hub-Signature-256)
//!   │
//!   ├─ no envelope fields ──────────────→ ChatEventSink → 200 {"status":"received"}
//!   │
//!   └─ envelope ─→ decrypt (bf-01) ─→ dispatch (bf-02) ─→ encrypt (bf-01)
//!                                                           │
//!                                                           └→ 200 text/plain base64
//! ```
//!
//! ## Status Mapping
//!
//! | Failure | Status |
//! |---------|--------|
//! | Key unwrap / payload authentication | 421 |
//! | Malformed envelope, plaintext or JSON | 400 |
//! | Signature mismatch | 432 |
//! | Encryption or internal failure | 500 |
//!
//! ## Other Routes
//!
//! - `GET /flow/initial-screen`: first APPOINTMENT payload as plain JSON
//! - `GET /health`: liveness
//! - `GET /metrics`: gateway counters as JSON
//! - `GET /metrics/prometheus`: process-wide Prometheus text format

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::LoggingChatSink;
pub use domain::{
    ChatSinkError, ConfigError, FlowError, FlowOutcome, GatewayConfig, GatewayError, HttpConfig,
    LimitsConfig, SecurityConfig, TimeoutConfig,
};
pub use middleware::{sign_body, GatewayMetrics, SIGNATURE_HEADER};
pub use ports::{ChatEventSink, RecordingChatSink};
pub use service::FlowGatewayService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
