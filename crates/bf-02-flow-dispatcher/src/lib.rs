//! # BF-02 Flow Dispatcher
//!
//! Stateless screen state machine for the appointment booking flow.
//!
//! **Subsystem ID:** 02  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turn one decrypted flow request into one plaintext response:
//! - `ping` answers a health check before any screen logic
//! - `data_exchange` routes by screen, inferring progress from field presence
//! - anything else is acknowledged
//!
//! ## Screens
//!
//! | Screen | Complete | Incomplete |
//! |--------|----------|------------|
//! | APPOINTMENT | DETAILS, selection echoed | APPOINTMENT, enablement flags |
//! | DETAILS | SUMMARY, summaries + consent flags | DETAILS, validation error |
//! | SUMMARY | SUCCESS, reference token | SUMMARY, validation or persistence error |
//!
//! ## Idempotence
//!
//! A repeated SUMMARY submission for the same contact and time returns the
//! original reference token and writes nothing.
//!
//! ## Module Structure
//!
//! ```text
//! bf-02-flow-dispatcher/
//! ├── domain/          # Request, Screen, FlowResponse, records, errors, config
//! ├── algorithms/      # Pure screen transition, summary text
//! ├── ports/           # FlowExchangeApi, store/catalog/messenger/clock traits
//! ├── adapters/        # In-memory store, static catalog, logging messenger
//! └── service.rs       # FlowDispatcher
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{CatalogError, InMemoryAppointmentStore, LoggingMessenger, StaticCatalog};
pub use algorithms::{transition, BookingPlan, CatalogSnapshot, Transition};
pub use domain::{
    AppointmentHandle, AppointmentRecord, AppointmentStatus, ConfigError, CustomerFields,
    CustomerHandle, CustomerRecord, DecryptedRequest, DispatchError, DispatcherConfig,
    FlowAction, FlowData, FlowResponse, Location, MessagingError, NewAppointment,
    ReferenceToken, Screen, ServiceOffering, StoreError, ValidationError,
};
pub use ports::{
    AppointmentStore, ConfirmationMessenger, FixedTimeSource, FlowExchangeApi, MockMessenger,
    ReferenceDataProvider, SystemTimeSource, TimeSource, UnavailableStore,
};
pub use service::FlowDispatcher;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
