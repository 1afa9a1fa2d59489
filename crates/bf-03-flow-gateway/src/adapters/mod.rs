//! Adapters for the Flow Gateway.

mod logging_sink;

pub use logging_sink::LoggingChatSink;
