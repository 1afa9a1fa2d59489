//! Prometheus metrics for the booking flow service.
//!
//! All metrics follow the naming convention: `bf_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ENVELOPE CODEC
    // =========================================================================

    /// Envelopes decrypted successfully
    pub static ref ENVELOPES_DECRYPTED: Counter = Counter::new(
        "bf_codec_envelopes_decrypted_total",
        "Total flow envelopes decrypted"
    ).expect("metric creation failed");

    /// Decrypt failures by class
    pub static ref DECRYPT_FAILURES: CounterVec = CounterVec::new(
        Opts::new("bf_codec_decrypt_failures_total", "Flow envelopes rejected"),
        &["class"]  // class: malformed_envelope/key_unwrap/payload_authentication/malformed_plaintext
    ).expect("metric creation failed");

    // =========================================================================
    // DISPATCHER
    // =========================================================================

    /// Responses by next screen
    pub static ref SCREEN_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("bf_flow_screen_transitions_total", "Flow responses by next screen"),
        &["screen"]  // screen: APPOINTMENT/DETAILS/SUMMARY/SUCCESS/ack
    ).expect("metric creation failed");

    /// Appointments written to the store
    pub static ref APPOINTMENTS_BOOKED: Counter = Counter::new(
        "bf_flow_appointments_booked_total",
        "Total appointments created"
    ).expect("metric creation failed");

    /// Confirmation sends by outcome
    pub static ref CONFIRMATIONS: CounterVec = CounterVec::new(
        Opts::new("bf_flow_confirmations_total", "Confirmation messages by outcome"),
        &["outcome"]  // outcome: sent/failed
    ).expect("metric creation failed");

    // =========================================================================
    // GATEWAY
    // =========================================================================

    /// Chat events handed to the sink
    pub static ref CHAT_EVENTS: Counter = Counter::new(
        "bf_gateway_chat_events_total",
        "Plain chat events received"
    ).expect("metric creation failed");

    /// Signature check rejections
    pub static ref SIGNATURE_REJECTIONS: Counter = Counter::new(
        "bf_gateway_signature_rejections_total",
        "Requests rejected for a bad X-Hub-Signature-256"
    ).expect("metric creation failed");

    /// End-to-end flow request time
    pub static ref FLOW_REQUEST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "bf_gateway_flow_request_duration_seconds",
            "Time from body received to encrypted response"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Keeps the registry alive for the process lifetime.
pub struct MetricsHandle {
    _registry: Registry,
}

/// Register every metric with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Codec
        Box::new(ENVELOPES_DECRYPTED.clone()),
        Box::new(DECRYPT_FAILURES.clone()),
        // Dispatcher
        Box::new(SCREEN_TRANSITIONS.clone()),
        Box::new(APPOINTMENTS_BOOKED.clone()),
        Box::new(CONFIRMATIONS.clone()),
        // Gateway
        Box::new(CHAT_EVENTS.clone()),
        Box::new(SIGNATURE_REJECTIONS.clone()),
        Box::new(FLOW_REQUEST_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: REGISTRY.clone(),
    })
}

/// Render all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
