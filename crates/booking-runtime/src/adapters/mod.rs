//! # Adapters
//!
//! Runtime-side implementations of the dispatcher's outbound ports.

pub mod cloud_api;
pub mod metered;

pub use cloud_api::CloudApiMessenger;
pub use metered::{MeteredMessenger, MeteredStore};
