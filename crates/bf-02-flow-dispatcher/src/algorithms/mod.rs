//! # Algorithms
//!
//! Pure screen logic and text formatting.

pub mod screen_machine;
pub mod summary;

pub use screen_machine::{
    initial_screen, needs_catalog, persistence_failure_response, success_response, transition,
    BookingPlan, Transition, PERSISTENCE_ERROR_MESSAGE,
};
pub use summary::{
    appointment_summary, confirmation_text, details_summary, format_long_date, format_short_date,
    success_message, CatalogSnapshot,
};
