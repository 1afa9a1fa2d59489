//! Dispatcher configuration with validation.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Flow dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Budget for each store stage on SUMMARY
    pub persistence_timeout_ms: u64,
    /// Budget for the confirmation message
    pub messaging_timeout_ms: u64,
    /// Budget for reference-data lookups
    pub reference_timeout_ms: u64,
    /// How many days ahead the date picker offers
    pub booking_horizon_days: u32,
    /// Offered start times, `HH:MM`
    pub time_slots: Vec<String>,
    /// Offset of the business's local time from UTC, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            persistence_timeout_ms: 3_000,
            messaging_timeout_ms: 3_000,
            reference_timeout_ms: 2_000,
            booking_horizon_days: 14,
            time_slots: (9..=17).map(|hour| format!("{hour:02}:00")).collect(),
            utc_offset_minutes: 0,
        }
    }
}

impl DispatcherConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "persistence timeout cannot be 0".into(),
            ));
        }

        if self.messaging_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "messaging timeout cannot be 0".into(),
            ));
        }

        if self.reference_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "reference timeout cannot be 0".into(),
            ));
        }

        if self.booking_horizon_days == 0 {
            return Err(ConfigError::Invalid(
                "booking_horizon_days cannot be 0".into(),
            ));
        }

        if self.time_slots.is_empty() {
            return Err(ConfigError::Invalid("time_slots cannot be empty".into()));
        }

        if let Some(bad) = self
            .time_slots
            .iter()
            .find(|slot| NaiveTime::parse_from_str(slot, "%H:%M").is_err())
        {
            return Err(ConfigError::InvalidTimeSlot(bad.clone()));
        }

        // Real-world offsets stay within +/- 14 hours
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }

        Ok(())
    }

    /// Longest a booking submission can spend in the dispatcher: the
    /// reference lookup, three store stages (find, upsert, create) and the
    /// confirmation send. An outer request timeout must exceed this.
    pub fn worst_case_ms(&self) -> u64 {
        self.reference_timeout_ms
            .saturating_add(self.persistence_timeout_ms.saturating_mul(3))
            .saturating_add(self.messaging_timeout_ms)
    }

    /// Store stage budget
    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    /// Confirmation send budget
    pub fn messaging_timeout(&self) -> Duration {
        Duration::from_millis(self.messaging_timeout_ms)
    }

    /// Reference-data budget
    pub fn reference_timeout(&self) -> Duration {
        Duration::from_millis(self.reference_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Time slot is not `HH:MM`
    #[error("invalid time slot: {0}")]
    InvalidTimeSlot(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DispatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time_slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(config.time_slots.last().map(String::as_str), Some("17:00"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DispatcherConfig {
            persistence_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_bad_time_slot_rejected() {
        let config = DispatcherConfig {
            time_slots: vec!["10:00".into(), "ten".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeSlot(ref s)) if s == "ten"
        ));
    }

    #[test]
    fn test_partial_config_deserialises_with_defaults() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{ "booking_horizon_days": 7 }"#).unwrap();
        assert_eq!(config.booking_horizon_days, 7);
        assert_eq!(config.persistence_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_worst_case_covers_every_stage() {
        let config = DispatcherConfig {
            persistence_timeout_ms: 1_000,
            messaging_timeout_ms: 700,
            reference_timeout_ms: 300,
            ..Default::default()
        };
        assert_eq!(config.worst_case_ms(), 4_000);
        assert_eq!(DispatcherConfig::default().worst_case_ms(), 14_000);
    }
}
