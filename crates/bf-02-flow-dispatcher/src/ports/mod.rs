//! # Ports Layer
//!
//! Inbound API and outbound collaborator traits.

pub mod inbound;
pub mod outbound;

pub use inbound::FlowExchangeApi;
pub use outbound::{
    AppointmentStore, ConfirmationMessenger, FixedTimeSource, MockMessenger,
    ReferenceDataProvider, SystemTimeSource, TimeSource, UnavailableStore,
};
