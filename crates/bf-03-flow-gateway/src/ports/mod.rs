//! Ports for the Flow Gateway.

pub mod outbound;

pub use outbound::{ChatEventSink, RecordingChatSink};
