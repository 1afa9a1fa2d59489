//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logs, traces and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// OpenTelemetry OTLP endpoint; tracing export is off when unset
    pub otlp_endpoint: Option<String>,

    /// Log filter directive (trace, debug, info, warn, error, or a full `EnvFilter`)
    pub log_level: String,

    /// Whether to write logs to stdout
    pub console_output: bool,

    /// Whether to format logs as JSON
    pub json_logs: bool,

    /// Deployment environment (development, staging, production)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "booking-flow".to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "development".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: booking-flow)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP collector; unset disables export
    /// - `BF_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `BF_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `BF_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `BF_ENVIRONMENT`: Deployment environment (default: development)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let defaults = Self::default();

        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),

            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),

            log_level: lookup("BF_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("BF_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("BF_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            environment: lookup("BF_ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// True if spans are exported over OTLP.
    pub fn tracing_export_enabled(&self) -> bool {
        self.otlp_endpoint.is_some()
    }
}
