//! # Runtime Configuration
//!
//! Everything the service reads from its environment, grouped by the
//! subsystem that consumes it.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Consumer |
//! |----------|---------|----------|
//! | `BF_HTTP_HOST` | `0.0.0.0` | gateway |
//! | `BF_HTTP_PORT` | `8080` | gateway |
//! | `BF_MAX_BODY_BYTES` | `1048576` | gateway |
//! | `BF_REQUEST_TIMEOUT_MS` | `15000` | gateway |
//! | `BF_APP_SECRET` | unset (no signature check) | gateway |
//! | `BF_PRIVATE_KEY_PATH` | `keys/flow_private_key.pem` | codec |
//! | `BF_PRIVATE_KEY_PASSPHRASE` | unset | codec |
//! | `BF_CATALOG_PATH` | unset (built-in catalog) | dispatcher |
//! | `BF_PERSISTENCE_TIMEOUT_MS` | `3000` | dispatcher |
//! | `BF_MESSAGING_TIMEOUT_MS` | `3000` | dispatcher |
//! | `BF_REFERENCE_TIMEOUT_MS` | `2000` | dispatcher |
//! | `BF_BOOKING_HORIZON_DAYS` | `14` | dispatcher |
//! | `BF_UTC_OFFSET_MINUTES` | `0` | dispatcher |
//! | `WHATSAPP_ACCESS_TOKEN` | unset (confirmations logged only) | messenger |
//! | `WHATSAPP_PHONE_NUMBER_ID` | unset | messenger |
//! | `WHATSAPP_API_VERSION` | `v21.0` | messenger |
//!
//! The request timeout must exceed the dispatcher's worst case
//! (`reference + 3 * persistence + messaging`), otherwise a booking could be
//! stored after the caller has already been answered with a timeout.
//!
//! Telemetry variables are read by `booking_telemetry::TelemetryConfig`.

use bf_02_flow_dispatcher::DispatcherConfig;
use bf_03_flow_gateway::GatewayConfig;
use booking_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// HTTP gateway.
    pub gateway: GatewayConfig,
    /// Screen dispatcher.
    pub dispatcher: DispatcherConfig,
    /// Flow private key.
    pub key: KeyConfig,
    /// Reference data file; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Confirmation messages.
    pub messaging: MessagingConfig,
    /// Logs, traces and metrics.
    pub telemetry: TelemetryConfig,
}

/// Where the flow private key lives.
#[derive(Clone)]
pub struct KeyConfig {
    /// PEM file path.
    pub path: PathBuf,
    /// Passphrase for an encrypted PKCS#8 key.
    pub passphrase: Option<String>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("keys/flow_private_key.pem"),
            passphrase: None,
        }
    }
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("path", &self.path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Messaging platform credentials.
#[derive(Clone)]
pub struct MessagingConfig {
    /// Graph API bearer token.
    pub access_token: Option<String>,
    /// Sending phone number id.
    pub phone_number_id: Option<String>,
    /// Graph API version segment.
    pub api_version: String,
    /// Graph API base URL.
    pub base_url: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            api_version: "v21.0".to_string(),
            base_url: "https://graph.facebook.com".to_string(),
        }
    }
}

impl MessagingConfig {
    /// True when both the token and the phone number id are set.
    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }
}

impl std::fmt::Debug for MessagingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("phone_number_id", &self.phone_number_id)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parse error.
        reason: String,
    },

    /// Gateway settings failed validation.
    #[error("gateway: {0}")]
    Gateway(#[from] bf_03_flow_gateway::ConfigError),

    /// Dispatcher settings failed validation.
    #[error("dispatcher: {0}")]
    Dispatcher(#[from] bf_02_flow_dispatcher::ConfigError),

    /// The request timeout leaves no room for the dispatcher's own timeouts.
    #[error(
        "BF_REQUEST_TIMEOUT_MS={request_ms} must exceed the dispatcher worst case of {required_ms}ms"
    )]
    TimeoutBudget {
        /// Configured request timeout.
        request_ms: u64,
        /// Reference, store and messaging timeouts combined.
        required_ms: u64,
    },

    /// Only one of the two messaging credentials is set.
    #[error("WHATSAPP_ACCESS_TOKEN and WHATSAPP_PHONE_NUMBER_ID must be set together")]
    PartialMessagingCredentials,
}

impl RuntimeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Self::default()
        };

        // Gateway
        if let Some(host) = parse_var(&var, "BF_HTTP_HOST")? {
            config.gateway.http.host = host;
        }
        if let Some(port) = parse_var(&var, "BF_HTTP_PORT")? {
            config.gateway.http.port = port;
        }
        if let Some(bytes) = parse_var(&var, "BF_MAX_BODY_BYTES")? {
            config.gateway.limits.max_body_bytes = bytes;
        }
        if let Some(ms) = parse_var(&var, "BF_REQUEST_TIMEOUT_MS")? {
            config.gateway.timeouts.request_ms = ms;
        }
        config.gateway.security.app_secret = var("BF_APP_SECRET");

        // Key
        if let Some(path) = var("BF_PRIVATE_KEY_PATH") {
            config.key.path = PathBuf::from(path);
        }
        config.key.passphrase = var("BF_PRIVATE_KEY_PASSPHRASE");

        // Dispatcher
        config.catalog_path = var("BF_CATALOG_PATH").map(PathBuf::from);
        if let Some(ms) = parse_var(&var, "BF_PERSISTENCE_TIMEOUT_MS")? {
            config.dispatcher.persistence_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&var, "BF_MESSAGING_TIMEOUT_MS")? {
            config.dispatcher.messaging_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&var, "BF_REFERENCE_TIMEOUT_MS")? {
            config.dispatcher.reference_timeout_ms = ms;
        }
        if let Some(days) = parse_var(&var, "BF_BOOKING_HORIZON_DAYS")? {
            config.dispatcher.booking_horizon_days = days;
        }
        if let Some(minutes) = parse_var(&var, "BF_UTC_OFFSET_MINUTES")? {
            config.dispatcher.utc_offset_minutes = minutes;
        }

        // Messaging
        config.messaging.access_token = var("WHATSAPP_ACCESS_TOKEN");
        config.messaging.phone_number_id = var("WHATSAPP_PHONE_NUMBER_ID");
        if let Some(version) = var("WHATSAPP_API_VERSION") {
            config.messaging.api_version = version;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        self.dispatcher.validate()?;

        let request_ms = self.gateway.timeouts.request_ms;
        let required_ms = self.dispatcher.worst_case_ms();
        if request_ms <= required_ms {
            return Err(ConfigError::TimeoutBudget {
                request_ms,
                required_ms,
            });
        }

        if self.messaging.access_token.is_some() != self.messaging.phone_number_id.is_some() {
            return Err(ConfigError::PartialMessagingCredentials);
        }
        Ok(())
    }
}

fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: name,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}
