//! What a call on the flow route ended as.
//!
//! Handlers attach a [`FlowOutcome`] to the response extensions; the
//! tracing layer copies it onto the request span.

/// Outcome of one `POST /flow` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Exchange answered with this screen label (`ack` for ping).
    Screen(&'static str),
    /// Plain chat event handed to the sink.
    ChatEvent,
    /// Call failed with this failure class.
    Failed(&'static str),
}

impl FlowOutcome {
    /// Span value for `flow.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowOutcome::Screen(_) => "exchange",
            FlowOutcome::ChatEvent => "chat_event",
            FlowOutcome::Failed(_) => "failure",
        }
    }

    /// Screen label, when a screen was answered.
    pub fn screen(&self) -> Option<&'static str> {
        match self {
            FlowOutcome::Screen(label) => Some(label),
            _ => None,
        }
    }

    /// Failure class, when the call failed.
    pub fn failure(&self) -> Option<&'static str> {
        match self {
            FlowOutcome::Failed(class) => Some(class),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_fields() {
        let success = FlowOutcome::Screen("SUCCESS");
        assert_eq!(success.kind(), "exchange");
        assert_eq!(success.screen(), Some("SUCCESS"));
        assert_eq!(success.failure(), None);

        let stale = FlowOutcome::Failed("key_unwrap");
        assert_eq!(stale.kind(), "failure");
        assert_eq!(stale.screen(), None);
        assert_eq!(stale.failure(), Some("key_unwrap"));

        assert_eq!(FlowOutcome::ChatEvent.kind(), "chat_event");
    }
}
