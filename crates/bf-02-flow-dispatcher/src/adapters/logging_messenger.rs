//! Logging Messenger
//!
//! Implements `ConfirmationMessenger` by logging instead of sending. Used
//! when no platform credentials are configured.

use crate::domain::MessagingError;
use crate::ports::outbound::ConfirmationMessenger;
use async_trait::async_trait;
use tracing::info;

/// Logs confirmations at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingMessenger;

#[async_trait]
impl ConfirmationMessenger for LoggingMessenger {
    async fn send_confirmation(&self, _contact_id: &str, text: &str) -> Result<(), MessagingError> {
        // Contact ids are personal data; log only the message size.
        info!(chars = text.chars().count(), "confirmation not sent (messaging disabled)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_messenger_succeeds() {
        assert!(LoggingMessenger
            .send_confirmation("+15550100", "hello")
            .await
            .is_ok());
    }
}
