//! Gateway counters.
//!
//! Atomics back the JSON view served on `GET /metrics`; each `record_*`
//! also bumps the matching Prometheus collector in `booking-telemetry`.

use bf_01_envelope_codec::FailureClass;
use booking_telemetry::{
    metric_inc, metric_observe, CHAT_EVENTS, DECRYPT_FAILURES, ENVELOPES_DECRYPTED,
    FLOW_REQUEST_DURATION, SCREEN_TRANSITIONS, SIGNATURE_REJECTIONS,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Flow gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Request counters
    /// Flow exchanges handled
    pub requests_total: AtomicU64,
    /// Exchanges answered with an encrypted reply
    pub requests_success: AtomicU64,
    /// Exchanges answered with an error status
    pub requests_error: AtomicU64,
    /// Requests cut off by the timeout layer
    pub timeouts: AtomicU64,

    // Envelope counters
    /// Envelopes decrypted
    pub envelopes_decrypted: AtomicU64,
    /// Envelopes rejected by the codec
    pub decrypt_failures: AtomicU64,
    /// Rejections that tell the platform to re-fetch the key
    pub key_stale_failures: AtomicU64,

    // Chat events
    /// Plain chat events handed to the sink
    pub chat_events: AtomicU64,

    // Security
    /// Bad or missing webhook signatures
    pub signature_rejections: AtomicU64,

    // Latency tracking
    /// Sum of exchange latencies
    pub total_latency_ms: AtomicU64,
    /// Samples in `total_latency_ms`
    pub request_count_for_latency: AtomicU64,
}

impl GatewayMetrics {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished flow exchange
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful decrypt
    pub fn record_decrypted(&self) {
        self.envelopes_decrypted.fetch_add(1, Ordering::Relaxed);
        metric_inc!(ENVELOPES_DECRYPTED);
    }

    /// Record a decrypt failure of the given class
    pub fn record_decrypt_failure(&self, class: FailureClass) {
        self.decrypt_failures.fetch_add(1, Ordering::Relaxed);
        if matches!(
            class,
            FailureClass::KeyUnwrap | FailureClass::PayloadAuthentication
        ) {
            self.key_stale_failures.fetch_add(1, Ordering::Relaxed);
        }
        metric_inc!(DECRYPT_FAILURES, &[class.as_str()]);
    }

    /// Record the screen a response moves to (`ack` for screenless replies)
    pub fn record_screen(&self, screen: &str) {
        metric_inc!(SCREEN_TRANSITIONS, &[screen]);
    }

    /// Record a plain chat event
    pub fn record_chat_event(&self) {
        self.chat_events.fetch_add(1, Ordering::Relaxed);
        metric_inc!(CHAT_EVENTS);
    }

    /// Record a signature rejection
    pub fn record_signature_rejection(&self) {
        self.signature_rejections.fetch_add(1, Ordering::Relaxed);
        metric_inc!(SIGNATURE_REJECTIONS);
    }

    /// Record a whole-request timeout
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "error": self.requests_error.load(Ordering::Relaxed),
                "timeouts": self.timeouts.load(Ordering::Relaxed),
            },
            "envelopes": {
                "decrypted": self.envelopes_decrypted.load(Ordering::Relaxed),
                "failures": self.decrypt_failures.load(Ordering::Relaxed),
                "key_stale": self.key_stale_failures.load(Ordering::Relaxed),
            },
            "chat_events": self.chat_events.load(Ordering::Relaxed),
            "security": {
                "signature_rejections": self.signature_rejections.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Request timing helper
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    /// Start timing.
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    /// Stop timing and record the outcome.
    pub fn finish(self, success: bool) {
        let elapsed = self.start.elapsed();
        metric_observe!(FLOW_REQUEST_DURATION, elapsed.as_secs_f64());
        self.metrics
            .record_request(success, elapsed.as_millis() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = GatewayMetrics::new();

        metrics.record_request(true, 100);
        metrics.record_request(true, 200);
        metrics.record_request(false, 50);

        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.requests_success.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_error.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_average_latency() {
        let metrics = GatewayMetrics::new();

        metrics.record_request(true, 100);
        metrics.record_request(true, 200);
        metrics.record_request(true, 300);

        assert!((metrics.average_latency_ms() - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_decrypt_failures_split_key_stale() {
        let metrics = GatewayMetrics::new();

        metrics.record_decrypt_failure(FailureClass::KeyUnwrap);
        metrics.record_decrypt_failure(FailureClass::PayloadAuthentication);
        metrics.record_decrypt_failure(FailureClass::MalformedEnvelope);

        let json = metrics.to_json();
        assert_eq!(json["envelopes"]["failures"], 3);
        assert_eq!(json["envelopes"]["key_stale"], 2);
    }

    #[test]
    fn test_json_export() {
        let metrics = GatewayMetrics::new();
        metrics.record_request(true, 100);
        metrics.record_decrypted();
        metrics.record_chat_event();

        let json = metrics.to_json();
        assert_eq!(json["requests"]["total"], 1);
        assert_eq!(json["envelopes"]["decrypted"], 1);
        assert_eq!(json["chat_events"], 1);
    }

    #[test]
    fn test_timer_records_request() {
        let metrics = Arc::new(GatewayMetrics::new());
        RequestTimer::new(Arc::clone(&metrics)).finish(false);
        assert_eq!(metrics.requests_error.load(Ordering::Relaxed), 1);
    }
}
