//! Logging Chat Sink
//!
//! Default `ChatEventSink`: logs the shape of the event and accepts it.

use crate::domain::ChatSinkError;
use crate::ports::outbound::ChatEventSink;
use async_trait::async_trait;
use booking_telemetry::log_event;

/// Logs chat events at info level and accepts them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingChatSink;

#[async_trait]
impl ChatEventSink for LoggingChatSink {
    async fn handle_event(&self, event: serde_json::Value) -> Result<(), ChatSinkError> {
        let object = event
            .get("object")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        let entries = event
            .get("entry")
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len);

        // Message bodies are personal data; only the envelope shape is logged.
        log_event!(info, "gateway", "Chat event received", object = object, entries = entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_logging_sink_accepts_anything() {
        let sink = LoggingChatSink;
        assert!(sink.handle_event(json!({"entry": [{}, {}]})).await.is_ok());
        assert!(sink.handle_event(json!("not an object")).await.is_ok());
    }
}
