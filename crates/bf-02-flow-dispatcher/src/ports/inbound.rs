//! # Inbound Ports
//!
//! What the gateway calls after decrypting an envelope.

use crate::domain::{DecryptedRequest, DispatchError, FlowResponse};
use async_trait::async_trait;

/// Flow data-exchange API.
#[async_trait]
pub trait FlowExchangeApi: Send + Sync {
    /// Handle one decrypted request.
    ///
    /// Never fails: validation and collaborator failures become screen
    /// payloads.
    async fn dispatch(&self, request: DecryptedRequest) -> FlowResponse;

    /// First APPOINTMENT payload, built from live reference data.
    async fn initial_screen(&self) -> Result<FlowResponse, DispatchError>;

    /// Parse decrypted plaintext and dispatch it.
    async fn dispatch_value(
        &self,
        plaintext: serde_json::Value,
    ) -> Result<FlowResponse, DispatchError> {
        let request = DecryptedRequest::from_value(plaintext)?;
        Ok(self.dispatch(request).await)
    }
}
