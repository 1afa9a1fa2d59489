//! # Summary Formatting
//!
//! Human-readable text shown on SUMMARY and SUCCESS and sent in the
//! confirmation message.

use crate::domain::{
    AppointmentSelection, ContactDetails, Location, ReferenceToken, ServiceOffering, TIME_FORMAT,
};
use chrono::NaiveDate;

/// Long date, e.g. `Friday, 26 September 2025`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

/// Short date for pickers, e.g. `Fri, 26 Sep 2025`.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%a, %-d %b %Y").to_string()
}

/// Active services and locations at the time of the request.
///
/// Lookups fall back to the raw id when the catalog does not know it.
#[derive(Clone, Debug, Default)]
pub struct CatalogSnapshot {
    /// Active services.
    pub services: Vec<ServiceOffering>,
    /// Active locations.
    pub locations: Vec<Location>,
}

impl CatalogSnapshot {
    /// Build from port results.
    pub fn new(services: Vec<ServiceOffering>, locations: Vec<Location>) -> Self {
        Self {
            services,
            locations,
        }
    }

    /// Display name of a service id.
    pub fn service_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.services
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.display_name.as_str())
            .unwrap_or(id)
    }

    /// Display name of a location id.
    pub fn location_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.locations
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.display_name.as_str())
            .unwrap_or(id)
    }
}

/// `Haircut at Downtown Studio` / `Friday, 26 September 2025 at 10:00`.
pub fn appointment_summary(selection: &AppointmentSelection, catalog: &CatalogSnapshot) -> String {
    format!(
        "{} at {}\n{} at {}",
        catalog.service_name(&selection.service),
        catalog.location_name(&selection.location),
        format_long_date(selection.date),
        selection.time.format(TIME_FORMAT),
    )
}

/// Name, phone and notes, one per line.
pub fn details_summary(contact: &ContactDetails) -> String {
    let mut text = format!("Name: {}\nPhone: {}", contact.name, contact.phone);
    if let Some(notes) = &contact.notes {
        text.push_str("\nNotes: ");
        text.push_str(notes);
    }
    text
}

/// Shown on SUCCESS.
pub fn success_message(reference: &ReferenceToken) -> String {
    format!("Your appointment is booked. Your reference is {reference}.")
}

/// Sent through the messenger after a booking.
pub fn confirmation_text(
    contact: &ContactDetails,
    appointment_summary: &str,
    reference: &ReferenceToken,
) -> String {
    format!(
        "Hi {}, your appointment is confirmed.\n{}\nReference: {}",
        contact.name, appointment_summary, reference
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn selection() -> AppointmentSelection {
        AppointmentSelection {
            service: "haircut".into(),
            location: "downtown".into(),
            date: NaiveDate::from_ymd_opt(2025, 9, 26).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_long_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 26).unwrap();
        assert_eq!(format_long_date(date), "Friday, 26 September 2025");
        assert_eq!(format_short_date(date), "Fri, 26 Sep 2025");
    }

    #[test]
    fn test_summary_uses_display_names() {
        let catalog = CatalogSnapshot::new(
            vec![ServiceOffering {
                id: "haircut".into(),
                display_name: "Haircut".into(),
                duration_minutes: 30,
            }],
            vec![Location {
                id: "downtown".into(),
                display_name: "Downtown Studio".into(),
                address: "1 Main St".into(),
            }],
        );
        assert_eq!(
            appointment_summary(&selection(), &catalog),
            "Haircut at Downtown Studio\nFriday, 26 September 2025 at 10:00"
        );
    }

    #[test]
    fn test_summary_falls_back_to_ids() {
        assert_eq!(
            appointment_summary(&selection(), &CatalogSnapshot::default()),
            "haircut at downtown\nFriday, 26 September 2025 at 10:00"
        );
    }

    #[test]
    fn test_details_summary_notes_optional() {
        let mut contact = ContactDetails {
            name: "Ana".into(),
            phone: "+15550100".into(),
            notes: None,
        };
        assert_eq!(details_summary(&contact), "Name: Ana\nPhone: +15550100");

        contact.notes = Some("Window seat".into());
        assert!(details_summary(&contact).ends_with("\nNotes: Window seat"));
    }
}
