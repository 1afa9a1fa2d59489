//! # Domain Value Objects
//!
//! Field names, the validated pieces of a booking, and the reference token.

use super::entities::FlowData;
use super::errors::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform `data` keys used by the booking flow.
pub mod fields {
    /// Service id.
    pub const SERVICE: &str = "service";
    /// Location id.
    pub const LOCATION: &str = "location";
    /// `YYYY-MM-DD`.
    pub const DATE: &str = "date";
    /// `HH:MM`.
    pub const TIME: &str = "time";
    /// Customer name.
    pub const NAME: &str = "name";
    /// Contact channel identifier.
    pub const PHONE: &str = "phone";
    /// Optional notes.
    pub const NOTES: &str = "notes";
    /// Privacy consent flag.
    pub const PRIVACY_CONSENT: &str = "privacyConsent";
    /// Terms consent flag.
    pub const TERMS_CONSENT: &str = "termsConsent";

    /// Selection fields in the order they are enabled.
    pub const SELECTION: [&str; 4] = [SERVICE, LOCATION, DATE, TIME];
    /// Contact fields required on DETAILS.
    pub const CONTACT: [&str; 2] = [NAME, PHONE];
}

/// Wire format of `date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format of `time`.
pub const TIME_FORMAT: &str = "%H:%M";

/// Non-empty trimmed string field. Numbers are accepted as their text form.
pub fn text_field<'a>(data: &'a FlowData, key: &str) -> Option<std::borrow::Cow<'a, str>> {
    match data.get(key)? {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then_some(std::borrow::Cow::Borrowed(trimmed))
        }
        serde_json::Value::Number(n) => Some(std::borrow::Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Boolean field. Accepts `true` and `"true"`.
pub fn flag_field(data: &FlowData, key: &str) -> bool {
    match data.get(key) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn missing(data: &FlowData, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter(|key| text_field(data, key).is_none())
        .map(|key| key.to_string())
        .collect()
}

/// Which APPOINTMENT dropdowns are enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnablementFlags {
    /// Set once a service is chosen.
    pub location: bool,
    /// Set once service and location are chosen.
    pub date: bool,
    /// Set once service, location and date are chosen.
    pub time: bool,
}

impl EnablementFlags {
    /// Derive from field presence.
    pub fn from_data(data: &FlowData) -> Self {
        let has = |key| text_field(data, key).is_some();
        let location = has(fields::SERVICE);
        let date = location && has(fields::LOCATION);
        let time = date && has(fields::DATE);
        Self {
            location,
            date,
            time,
        }
    }
}

/// Service, location, date and time, all present and parseable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentSelection {
    /// Service id.
    pub service: String,
    /// Location id.
    pub location: String,
    /// Day.
    pub date: NaiveDate,
    /// Start time.
    pub time: NaiveTime,
}

impl AppointmentSelection {
    /// Validate the four selection fields.
    pub fn from_data(data: &FlowData) -> Result<Self, ValidationError> {
        let absent = missing(data, &fields::SELECTION);
        if !absent.is_empty() {
            return Err(ValidationError::MissingFields(absent));
        }

        let text = |key| text_field(data, key).map(|v| v.into_owned()).unwrap_or_default();
        let raw_date = text(fields::DATE);
        let raw_time = text(fields::TIME);

        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(raw_date.clone()))?;
        let time = NaiveTime::parse_from_str(&raw_time, TIME_FORMAT)
            .map_err(|_| ValidationError::InvalidTime(raw_time.clone()))?;

        Ok(Self {
            service: text(fields::SERVICE),
            location: text(fields::LOCATION),
            date,
            time,
        })
    }

    /// Local wall-clock start.
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Name, phone and optional notes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactDetails {
    /// Name as entered.
    pub name: String,
    /// Contact channel identifier.
    pub phone: String,
    /// Optional notes.
    pub notes: Option<String>,
}

impl ContactDetails {
    /// Validate name and phone.
    pub fn from_data(data: &FlowData) -> Result<Self, ValidationError> {
        let absent = missing(data, &fields::CONTACT);
        if !absent.is_empty() {
            return Err(ValidationError::MissingFields(absent));
        }

        let text = |key| text_field(data, key).map(|v| v.into_owned());
        Ok(Self {
            name: text(fields::NAME).unwrap_or_default(),
            phone: text(fields::PHONE).unwrap_or_default(),
            notes: text(fields::NOTES),
        })
    }
}

/// Everything needed to book: selection plus contact details.
///
/// Missing fields from both halves are reported together.
pub fn booking_fields(
    data: &FlowData,
) -> Result<(AppointmentSelection, ContactDetails), ValidationError> {
    let mut absent = missing(data, &fields::SELECTION);
    absent.extend(missing(data, &fields::CONTACT));
    if !absent.is_empty() {
        return Err(ValidationError::MissingFields(absent));
    }
    Ok((
        AppointmentSelection::from_data(data)?,
        ContactDetails::from_data(data)?,
    ))
}

/// Both consent flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Consents {
    /// Privacy policy accepted.
    pub privacy: bool,
    /// Terms accepted.
    pub terms: bool,
}

impl Consents {
    /// Read both flags.
    pub fn from_data(data: &FlowData) -> Self {
        Self {
            privacy: flag_field(data, fields::PRIVACY_CONSENT),
            terms: flag_field(data, fields::TERMS_CONSENT),
        }
    }

    /// Both given.
    pub fn granted(&self) -> bool {
        self.privacy && self.terms
    }
}

/// Short human-shareable booking reference, `APT-` plus six digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceToken(String);

impl ReferenceToken {
    /// Prefix of every token.
    pub const PREFIX: &'static str = "APT-";

    /// Derive from the millisecond clock.
    pub fn from_clock(now: DateTime<Utc>) -> Self {
        let suffix = now.timestamp_millis().rem_euclid(1_000_000);
        Self(format!("{}{:06}", Self::PREFIX, suffix))
    }

    /// The token after this one, wrapping from `APT-999999` to `APT-000000`.
    pub fn successor(&self) -> Self {
        let current: u32 = self.0[Self::PREFIX.len()..].parse().unwrap_or(0);
        Self(format!("{}{:06}", Self::PREFIX, (current + 1) % 1_000_000))
    }

    /// Wrap an existing token, checking its shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix(Self::PREFIX)?;
        (digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(raw.to_string()))
    }

    /// Token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
