//! Domain layer for the Flow Gateway.

pub mod config;
pub mod error;
pub mod outcome;

pub use config::*;
pub use error::*;
pub use outcome::FlowOutcome;
