//! # Domain Errors
//!
//! Error types for the flow dispatcher and its collaborators.

use super::entities::AppointmentRecord;
use super::value_objects::ReferenceToken;
use thiserror::Error;

/// Errors surfaced by the dispatcher boundary.
///
/// Only `InvalidRequest` and `ReferenceData` ever reach a caller; the other
/// variants are folded into screen-level error payloads by the service.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Decrypted plaintext is JSON but not a flow request.
    #[error("Invalid flow request: {0}")]
    InvalidRequest(String),

    /// Reference data could not be loaded.
    #[error("Reference data unavailable: {0}")]
    ReferenceData(String),

    /// Persistence collaborator failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// Collaborator call exceeded its budget.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// Which call timed out.
        operation: &'static str,
        /// Budget in milliseconds.
        timeout_ms: u64,
    },
}

/// Appointment store errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// An appointment for the same contact and time already exists.
    #[error("Appointment already exists: {}", .0.reference)]
    Duplicate(Box<AppointmentRecord>),

    /// Another appointment already carries this reference token.
    #[error("Reference token already in use: {0}")]
    ReferenceTaken(ReferenceToken),

    /// Backend is unreachable or rejected the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Confirmation messaging errors.
#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    /// Platform answered with a non-success status.
    #[error("Message rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Network or encoding failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No credentials configured.
    #[error("Messaging not configured")]
    NotConfigured,
}

/// Screen-level validation failure.
///
/// Never an HTTP error; rendered back onto the same screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required fields are absent or empty.
    #[error("Please complete: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// `date` is not `YYYY-MM-DD`.
    #[error("The selected date is not valid")]
    InvalidDate(String),

    /// `time` is not `HH:MM`.
    #[error("The selected time is not valid")]
    InvalidTime(String),

    /// Privacy or terms consent not given.
    #[error("Please accept the privacy policy and terms to continue")]
    ConsentRequired,
}

impl ValidationError {
    /// Field names the user still has to fill in.
    pub fn missing_fields(&self) -> Vec<String> {
        match self {
            ValidationError::MissingFields(fields) => fields.clone(),
            ValidationError::InvalidDate(_) => vec!["date".to_string()],
            ValidationError::InvalidTime(_) => vec!["time".to_string()],
            ValidationError::ConsentRequired => Vec::new(),
        }
    }
}
