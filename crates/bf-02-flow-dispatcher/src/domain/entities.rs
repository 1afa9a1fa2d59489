//! # Domain Entities
//!
//! Decrypted request, screens, responses and the persisted records.

use super::value_objects::ReferenceToken;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Key/value payload of a screen.
pub type FlowData = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// REQUEST
// =============================================================================

/// What the platform asks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlowAction {
    /// Health check.
    Ping,
    /// Screen submission.
    DataExchange,
    /// Anything else (`INIT`, `BACK`, error notifications).
    Other(String),
}

impl FlowAction {
    /// Case-insensitive parse.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("ping") {
            FlowAction::Ping
        } else if trimmed.eq_ignore_ascii_case("data_exchange") {
            FlowAction::DataExchange
        } else {
            FlowAction::Other(trimmed.to_string())
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            FlowAction::Ping => "ping",
            FlowAction::DataExchange => "data_exchange",
            FlowAction::Other(raw) => raw,
        }
    }
}

impl From<String> for FlowAction {
    fn from(raw: String) -> Self {
        FlowAction::parse(&raw)
    }
}

impl From<FlowAction> for String {
    fn from(action: FlowAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed flow request. Lives for one HTTP request only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptedRequest {
    /// Requested action.
    pub action: FlowAction,
    /// Screen the user submitted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    /// Submitted fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FlowData>,
    /// Flow protocol version.
    #[serde(default)]
    pub version: String,
    /// Opaque per-flow token issued by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_token: Option<String>,
}

impl DecryptedRequest {
    /// Build from decrypted plaintext.
    pub fn from_value(value: serde_json::Value) -> Result<Self, super::DispatchError> {
        serde_json::from_value(value).map_err(|e| super::DispatchError::InvalidRequest(e.to_string()))
    }

    /// Parsed screen, if any.
    pub fn screen(&self) -> Option<Screen> {
        self.screen.as_deref().map(Screen::parse)
    }

    /// Submitted fields, empty if none were sent.
    pub fn fields(&self) -> FlowData {
        self.data.clone().unwrap_or_default()
    }
}

// =============================================================================
// SCREENS
// =============================================================================

/// Flow screens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Screen {
    /// Service, location, date and time selection.
    Appointment,
    /// Contact details.
    Details,
    /// Review and consent.
    Summary,
    /// Booking confirmed.
    Success,
    /// Not part of this flow.
    Unknown(String),
}

impl Screen {
    /// Parse a platform screen id.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPOINTMENT" => Screen::Appointment,
            "DETAILS" => Screen::Details,
            "SUMMARY" => Screen::Summary,
            "SUCCESS" => Screen::Success,
            _ => Screen::Unknown(raw.to_string()),
        }
    }

    /// Platform screen id.
    pub fn as_str(&self) -> &str {
        match self {
            Screen::Appointment => "APPOINTMENT",
            Screen::Details => "DETAILS",
            Screen::Summary => "SUMMARY",
            Screen::Success => "SUCCESS",
            Screen::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Screen {
    fn from(raw: String) -> Self {
        Screen::parse(&raw)
    }
}

impl From<Screen> for String {
    fn from(screen: Screen) -> Self {
        screen.as_str().to_string()
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Plaintext response handed to the codec.
///
/// Serialises as `{"screen": "...", "data": {...}}`, or `{"data": {...}}`
/// for acknowledgments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowResponse {
    /// Next screen; absent for acknowledgments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<Screen>,
    /// Screen payload.
    pub data: FlowData,
}

impl FlowResponse {
    /// Navigate to `screen` with `data`.
    pub fn screen(screen: Screen, data: FlowData) -> Self {
        Self {
            screen: Some(screen),
            data,
        }
    }

    /// `{"data": {"status": "active"}}`
    pub fn ping() -> Self {
        let mut data = FlowData::new();
        data.insert("status".into(), "active".into());
        Self { screen: None, data }
    }

    /// `{"data": {"acknowledged": true}}`
    pub fn acknowledged() -> Self {
        let mut data = FlowData::new();
        data.insert("acknowledged".into(), true.into());
        Self { screen: None, data }
    }

    /// True if this response carries the screen-level error flag.
    pub fn is_error(&self) -> bool {
        self.data
            .get("error")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

// =============================================================================
// REFERENCE DATA
// =============================================================================

/// A bookable service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    /// Stable id submitted by the flow.
    pub id: String,
    /// Name shown to the user.
    pub display_name: String,
    /// Slot length.
    pub duration_minutes: u32,
}

/// A place appointments happen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Stable id submitted by the flow.
    pub id: String,
    /// Name shown to the user.
    pub display_name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
}

// =============================================================================
// PERSISTED RECORDS
// =============================================================================

/// Opaque customer id issued by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerHandle(pub Uuid);

/// Opaque appointment id issued by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentHandle(pub Uuid);

/// Fields written on customer upsert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerFields {
    /// Name as entered.
    pub display_name: String,
    /// When consent was given.
    pub consent_at: DateTime<Utc>,
}

/// Stored customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Store id.
    pub handle: CustomerHandle,
    /// Contact channel identifier (phone).
    pub contact_id: String,
    /// Name as last entered.
    pub display_name: String,
    /// Latest consent timestamp.
    pub consent_at: DateTime<Utc>,
}

/// Appointment lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    /// Booked through the flow.
    #[default]
    Scheduled,
    /// Confirmed by staff.
    Confirmed,
    /// Cancelled by either side.
    Cancelled,
    /// Took place.
    Completed,
}

/// Appointment to insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAppointment {
    /// Human-shareable token.
    pub reference: ReferenceToken,
    /// Owning customer.
    pub customer: CustomerHandle,
    /// Contact channel identifier; part of the uniqueness key.
    pub contact_id: String,
    /// Booked service id.
    pub service_id: String,
    /// Booked location id.
    pub location_id: String,
    /// Local wall-clock start; part of the uniqueness key.
    pub scheduled_at: NaiveDateTime,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Stored appointment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    /// Store id.
    pub handle: AppointmentHandle,
    /// Human-shareable token.
    pub reference: ReferenceToken,
    /// Owning customer.
    pub customer: CustomerHandle,
    /// Contact channel identifier.
    pub contact_id: String,
    /// Booked service id.
    pub service_id: String,
    /// Booked location id.
    pub location_id: String,
    /// Local wall-clock start.
    pub scheduled_at: NaiveDateTime,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Lifecycle state.
    pub status: AppointmentStatus,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_is_case_insensitive() {
        assert_eq!(FlowAction::parse("PING"), FlowAction::Ping);
        assert_eq!(FlowAction::parse("Data_Exchange"), FlowAction::DataExchange);
        assert_eq!(FlowAction::parse("INIT"), FlowAction::Other("INIT".into()));
    }

    #[test]
    fn test_request_from_platform_json() {
        let request = DecryptedRequest::from_value(json!({
            "version": "3.0",
            "action": "data_exchange",
            "screen": "APPOINTMENT",
            "data": { "service": "haircut" },
            "flow_token": "tok-1"
        }))
        .unwrap();

        assert_eq!(request.action, FlowAction::DataExchange);
        assert_eq!(request.screen(), Some(Screen::Appointment));
        assert_eq!(request.fields().get("service"), Some(&json!("haircut")));
        assert_eq!(request.flow_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_ping_without_screen_or_data() {
        let request = DecryptedRequest::from_value(json!({ "version": "3.0", "action": "ping" })).unwrap();
        assert_eq!(request.action, FlowAction::Ping);
        assert!(request.screen().is_none());
        assert!(request.fields().is_empty());
    }

    #[test]
    fn test_missing_action_is_invalid() {
        let result = DecryptedRequest::from_value(json!({ "screen": "DETAILS" }));
        assert!(matches!(result, Err(super::super::DispatchError::InvalidRequest(_))));
    }

    #[test]
    fn test_unknown_screen_keeps_raw_name() {
        assert_eq!(Screen::parse("WELCOME"), Screen::Unknown("WELCOME".into()));
        assert_eq!(Screen::parse("summary"), Screen::Summary);
    }

    #[test]
    fn test_response_serialisation_shapes() {
        assert_eq!(
            serde_json::to_value(FlowResponse::ping()).unwrap(),
            json!({ "data": { "status": "active" } })
        );
        assert_eq!(
            serde_json::to_value(FlowResponse::acknowledged()).unwrap(),
            json!({ "data": { "acknowledged": true } })
        );

        let mut data = FlowData::new();
        data.insert("date".into(), json!("2025-09-26"));
        assert_eq!(
            serde_json::to_value(FlowResponse::screen(Screen::Details, data)).unwrap(),
            json!({ "screen": "DETAILS", "data": { "date": "2025-09-26" } })
        );
    }
}
