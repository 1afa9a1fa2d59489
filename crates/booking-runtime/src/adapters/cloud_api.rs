//! # Cloud API Messenger
//!
//! Sends booking confirmations as plain text messages through the Graph
//! API `/{phone_number_id}/messages` endpoint.

use async_trait::async_trait;
use bf_02_flow_dispatcher::{ConfirmationMessenger, MessagingError};
use booking_telemetry::log_event;
use serde::Serialize;
use std::time::Duration;

use crate::container::config::MessagingConfig;

/// Longest response body kept in a `Rejected` error.
const MAX_ERROR_BODY: usize = 512;

/// Graph API client for confirmation messages.
pub struct CloudApiMessenger {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    preview_url: bool,
    body: &'a str,
}

impl CloudApiMessenger {
    /// Build from messaging credentials.
    ///
    /// `timeout` bounds each request end to end; the dispatcher applies its
    /// own messaging timeout on top.
    pub fn new(config: &MessagingConfig, timeout: Duration) -> Result<Self, MessagingError> {
        let (Some(token), Some(phone_number_id)) =
            (&config.access_token, &config.phone_number_id)
        else {
            return Err(MessagingError::NotConfigured);
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| MessagingError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/{}/messages",
                config.base_url.trim_end_matches('/'),
                config.api_version,
                phone_number_id
            ),
            access_token: token.clone(),
        })
    }

    /// Full messages endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ConfirmationMessenger for CloudApiMessenger {
    async fn send_confirmation(&self, contact_id: &str, text: &str) -> Result<(), MessagingError> {
        let message = TextMessage {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: contact_id,
            kind: "text",
            text: TextBody {
                preview_url: false,
                body: text,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| MessagingError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            log_event!(debug, "messenger", "confirmation accepted", status = status.as_u16());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MessagingError::Rejected {
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
