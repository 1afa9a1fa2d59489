//! # Booking Telemetry
//!
//! Observability for the booking flow service.
//!
//! ## Components
//!
//! - Console logs through `tracing-subscriber`, pretty or JSON
//! - Span export to an OTLP collector when `OTEL_EXPORTER_OTLP_ENDPOINT` is set
//! - Prometheus counters in a process-wide [`REGISTRY`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use booking_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())
//!         .await
//!         .expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP gRPC endpoint; unset disables export |
//! | `OTEL_SERVICE_NAME` | `booking-flow` | Service name in traces |
//! | `BF_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `BF_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, APPOINTMENTS_BOOKED, CHAT_EVENTS,
    CONFIRMATIONS, DECRYPT_FAILURES, ENVELOPES_DECRYPTED, FLOW_REQUEST_DURATION, REGISTRY,
    SCREEN_TRANSITIONS, SIGNATURE_REJECTIONS,
};
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber or OTLP pipeline could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    /// Prometheus registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Bad filter directive or similar.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the tracing subscriber.
///
/// Hold the returned guard for the lifetime of the process; dropping it
/// flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config).await?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Increment a counter, optionally with label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Record an observation on a histogram.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
