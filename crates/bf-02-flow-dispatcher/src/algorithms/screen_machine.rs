//! # Screen State Machine
//!
//! Pure transition from a decrypted request to either a response or a
//! booking plan. No I/O; the service executes plans.
//!
//! Progress is inferred from which fields are present, so the machine
//! keeps no state between requests.

use super::summary::{self, CatalogSnapshot};
use crate::domain::{
    booking_fields, fields, AppointmentSelection, Consents, ContactDetails, DecryptedRequest,
    EnablementFlags, FlowAction, FlowData, FlowResponse, ReferenceToken, Screen, ValidationError,
    DATE_FORMAT, TIME_FORMAT,
};
use chrono::{Days, NaiveDate};
use serde_json::{json, Value};

/// Response keys.
pub mod keys {
    /// APPOINTMENT: location dropdown enabled.
    pub const LOCATION_ENABLED: &str = "locationEnabled";
    /// APPOINTMENT: date dropdown enabled.
    pub const DATE_ENABLED: &str = "dateEnabled";
    /// APPOINTMENT: time dropdown enabled.
    pub const TIME_ENABLED: &str = "timeEnabled";
    /// SUMMARY / SUCCESS: appointment text.
    pub const APPOINTMENT_SUMMARY: &str = "appointmentSummary";
    /// SUMMARY: contact text.
    pub const DETAILS_SUMMARY: &str = "detailsSummary";
    /// SUCCESS: confirmation text.
    pub const SUCCESS_MESSAGE: &str = "successMessage";
    /// SUCCESS: booking reference.
    pub const REFERENCE_TOKEN: &str = "referenceToken";
    /// Validation flag.
    pub const ERROR: &str = "error";
    /// Validation text.
    pub const ERROR_MESSAGE: &str = "errorMessage";
    /// Fields still to fill in.
    pub const MISSING_FIELDS: &str = "missingFields";
}

/// Shown when the store fails or times out.
pub const PERSISTENCE_ERROR_MESSAGE: &str =
    "We could not save your appointment right now. Please try again.";

/// What to do with a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Reply directly.
    Respond(FlowResponse),
    /// Persist a booking, then reply.
    Book(BookingPlan),
}

/// A validated SUMMARY submission with both consents given.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingPlan {
    /// Service, location, date, time.
    pub selection: AppointmentSelection,
    /// Name, phone, notes.
    pub contact: ContactDetails,
    /// Rendered appointment text.
    pub appointment_summary: String,
    /// Submitted fields, for re-rendering SUMMARY on failure.
    pub passthrough: FlowData,
}

/// Decide the next step for a request.
pub fn transition(request: &DecryptedRequest, catalog: &CatalogSnapshot) -> Transition {
    match request.action {
        FlowAction::Ping => Transition::Respond(FlowResponse::ping()),
        FlowAction::Other(_) => Transition::Respond(FlowResponse::acknowledged()),
        FlowAction::DataExchange => {
            let data = request.fields();
            match request.screen() {
                Some(Screen::Appointment) => Transition::Respond(appointment_step(&data)),
                Some(Screen::Details) => Transition::Respond(details_step(&data, catalog)),
                Some(Screen::Summary) => summary_step(&data, catalog),
                Some(Screen::Success) | Some(Screen::Unknown(_)) | None => {
                    Transition::Respond(FlowResponse::acknowledged())
                }
            }
        }
    }
}

/// True if the step renders summaries and so needs reference data.
pub fn needs_catalog(request: &DecryptedRequest) -> bool {
    request.action == FlowAction::DataExchange
        && matches!(request.screen(), Some(Screen::Details | Screen::Summary))
}

fn appointment_step(data: &FlowData) -> FlowResponse {
    match AppointmentSelection::from_data(data) {
        Ok(selection) => {
            let mut out = FlowData::new();
            out.insert(fields::SERVICE.into(), selection.service.clone().into());
            out.insert(fields::LOCATION.into(), selection.location.clone().into());
            out.insert(
                fields::DATE.into(),
                selection.date.format(DATE_FORMAT).to_string().into(),
            );
            out.insert(
                fields::TIME.into(),
                selection.time.format(TIME_FORMAT).to_string().into(),
            );
            FlowResponse::screen(Screen::Details, out)
        }
        Err(ValidationError::MissingFields(_)) => {
            FlowResponse::screen(Screen::Appointment, enablement_payload(data))
        }
        Err(err) => {
            let mut out = enablement_payload(data);
            apply_error(&mut out, &err.to_string(), err.missing_fields());
            FlowResponse::screen(Screen::Appointment, out)
        }
    }
}

fn enablement_payload(data: &FlowData) -> FlowData {
    let flags = EnablementFlags::from_data(data);
    let mut out = FlowData::new();
    out.insert(keys::LOCATION_ENABLED.into(), flags.location.into());
    out.insert(keys::DATE_ENABLED.into(), flags.date.into());
    out.insert(keys::TIME_ENABLED.into(), flags.time.into());
    out
}

fn details_step(data: &FlowData, catalog: &CatalogSnapshot) -> FlowResponse {
    match booking_fields(data) {
        Ok((selection, contact)) => {
            let mut out = passthrough(data);
            out.insert(
                keys::APPOINTMENT_SUMMARY.into(),
                summary::appointment_summary(&selection, catalog).into(),
            );
            out.insert(
                keys::DETAILS_SUMMARY.into(),
                summary::details_summary(&contact).into(),
            );
            out.insert(fields::PRIVACY_CONSENT.into(), false.into());
            out.insert(fields::TERMS_CONSENT.into(), false.into());
            FlowResponse::screen(Screen::Summary, out)
        }
        Err(err) => validation_failure(Screen::Details, data, &err),
    }
}

fn summary_step(data: &FlowData, catalog: &CatalogSnapshot) -> Transition {
    let (selection, contact) = match booking_fields(data) {
        Ok(parts) => parts,
        Err(err) => return Transition::Respond(validation_failure(Screen::Summary, data, &err)),
    };

    if !Consents::from_data(data).granted() {
        return Transition::Respond(validation_failure(
            Screen::Summary,
            data,
            &ValidationError::ConsentRequired,
        ));
    }

    Transition::Book(BookingPlan {
        appointment_summary: summary::appointment_summary(&selection, catalog),
        selection,
        contact,
        passthrough: passthrough(data),
    })
}

/// Submitted fields minus any stale error keys.
fn passthrough(data: &FlowData) -> FlowData {
    let mut out = data.clone();
    out.remove(keys::ERROR);
    out.remove(keys::ERROR_MESSAGE);
    out.remove(keys::MISSING_FIELDS);
    out
}

fn apply_error(out: &mut FlowData, message: &str, missing: Vec<String>) {
    out.insert(keys::ERROR.into(), true.into());
    out.insert(keys::ERROR_MESSAGE.into(), message.into());
    out.insert(keys::MISSING_FIELDS.into(), json!(missing));
}

fn validation_failure(screen: Screen, data: &FlowData, err: &ValidationError) -> FlowResponse {
    let mut out = passthrough(data);
    apply_error(&mut out, &err.to_string(), err.missing_fields());
    FlowResponse::screen(screen, out)
}

/// SUCCESS after a booking (new or deduplicated).
pub fn success_response(reference: &ReferenceToken, appointment_summary: &str) -> FlowResponse {
    let mut out = FlowData::new();
    out.insert(
        keys::SUCCESS_MESSAGE.into(),
        summary::success_message(reference).into(),
    );
    out.insert(keys::APPOINTMENT_SUMMARY.into(), appointment_summary.into());
    out.insert(keys::REFERENCE_TOKEN.into(), reference.as_str().into());
    FlowResponse::screen(Screen::Success, out)
}

/// SUMMARY again, flagged, after the store failed.
pub fn persistence_failure_response(plan: &BookingPlan) -> FlowResponse {
    let mut out = plan.passthrough.clone();
    apply_error(&mut out, PERSISTENCE_ERROR_MESSAGE, Vec::new());
    FlowResponse::screen(Screen::Summary, out)
}

/// First APPOINTMENT payload: pickers and disabled dropdowns.
pub fn initial_screen(
    catalog: &CatalogSnapshot,
    today: NaiveDate,
    horizon_days: u32,
    time_slots: &[String],
) -> FlowResponse {
    let option = |id: &str, title: &str| json!({ "id": id, "title": title });

    let services: Vec<Value> = catalog
        .services
        .iter()
        .map(|s| option(&s.id, &s.display_name))
        .collect();
    let locations: Vec<Value> = catalog
        .locations
        .iter()
        .map(|l| option(&l.id, &l.display_name))
        .collect();
    let dates: Vec<Value> = (0..u64::from(horizon_days))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| {
            option(
                &date.format(DATE_FORMAT).to_string(),
                &summary::format_short_date(date),
            )
        })
        .collect();
    let times: Vec<Value> = time_slots.iter().map(|t| option(t, t)).collect();

    let mut out = FlowData::new();
    out.insert("services".into(), Value::Array(services));
    out.insert("locations".into(), Value::Array(locations));
    out.insert("dates".into(), Value::Array(dates));
    out.insert("times".into(), Value::Array(times));
    out.insert(keys::LOCATION_ENABLED.into(), false.into());
    out.insert(keys::DATE_ENABLED.into(), false.into());
    out.insert(keys::TIME_ENABLED.into(), false.into());
    FlowResponse::screen(Screen::Appointment, out)
}
