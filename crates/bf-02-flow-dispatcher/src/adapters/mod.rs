//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports.

mod logging_messenger;
mod memory_store;
mod static_catalog;

pub use logging_messenger::LoggingMessenger;
pub use memory_store::InMemoryAppointmentStore;
pub use static_catalog::{CatalogError, StaticCatalog};
