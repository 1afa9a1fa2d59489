//! # Outbound Ports
//!
//! Where non-flow webhook traffic goes.

use crate::domain::ChatSinkError;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Receiver for plain chat webhook events (messages, statuses).
///
/// The conversational side of the bot lives behind this port; the gateway
/// only routes to it.
#[async_trait]
pub trait ChatEventSink: Send + Sync {
    /// Accept one webhook body.
    async fn handle_event(&self, event: serde_json::Value) -> Result<(), ChatSinkError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Sink that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingChatSink {
    /// Events, in arrival order.
    pub events: Mutex<Vec<serde_json::Value>>,
    /// Reject every event?
    pub should_fail: bool,
}

impl RecordingChatSink {
    /// Sink that always rejects.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Number of events received.
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

#[async_trait]
impl ChatEventSink for RecordingChatSink {
    async fn handle_event(&self, event: serde_json::Value) -> Result<(), ChatSinkError> {
        if self.should_fail {
            return Err(ChatSinkError::Rejected("Mock failure".to_string()));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_recording_sink_keeps_events() {
        let sink = RecordingChatSink::default();
        sink.handle_event(json!({"object": "whatsapp_business_account"}))
            .await
            .unwrap();
        assert_eq!(sink.event_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let sink = RecordingChatSink::failing();
        assert!(sink.handle_event(json!({})).await.is_err());
        assert_eq!(sink.event_count(), 0);
    }
}
