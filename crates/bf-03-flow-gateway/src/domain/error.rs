//! Gateway error types and their HTTP status mapping.
//!
//! | Failure | Status |
//! |---------|--------|
//! | key unwrap, payload authentication | 421 |
//! | malformed envelope or plaintext, bad JSON, not a flow request | 400 |
//! | webhook signature mismatch | 432 |
//! | response encryption, dispatcher, chat sink | 500 |
//!
//! Error bodies are fixed strings. Diagnostics go to the log only; error
//! responses carry a [`FlowOutcome::Failed`] extension for the request span.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bf_01_envelope_codec::CodecError;
use bf_02_flow_dispatcher::DispatchError;

use super::outcome::FlowOutcome;

/// Status the platform treats as "signature rejected".
pub const SIGNATURE_MISMATCH_STATUS: u16 = 432;

/// `432` as a `StatusCode`.
pub fn signature_mismatch_status() -> StatusCode {
    StatusCode::from_u16(SIGNATURE_MISMATCH_STATUS).unwrap_or(StatusCode::UNAUTHORIZED)
}

/// Failure of one `POST /flow` exchange.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Envelope could not be decrypted, or the reply could not be sealed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Body was not JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Body was larger than the configured limit.
    #[error("request body too large")]
    BodyTooLarge,

    /// `X-Hub-Signature-256` missing or wrong.
    #[error("webhook signature mismatch")]
    SignatureMismatch,

    /// Dispatcher rejected the plaintext or failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Chat event handler failed.
    #[error("chat event rejected: {0}")]
    ChatSink(#[from] ChatSinkError),
}

impl FlowError {
    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            FlowError::Codec(e) if e.is_key_stale() => StatusCode::MISDIRECTED_REQUEST,
            FlowError::Codec(e) if e.is_malformed_request() => StatusCode::BAD_REQUEST,
            FlowError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FlowError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            FlowError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FlowError::SignatureMismatch => signature_mismatch_status(),
            FlowError::Dispatch(DispatchError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            FlowError::Dispatch(_) | FlowError::ChatSink(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short failure class for spans and logs.
    pub fn failure_class(&self) -> &'static str {
        match self {
            FlowError::Codec(e) => e.class().as_str(),
            FlowError::InvalidBody(_) => "invalid_body",
            FlowError::BodyTooLarge => "body_too_large",
            FlowError::SignatureMismatch => "signature_mismatch",
            FlowError::Dispatch(DispatchError::InvalidRequest(_)) => "invalid_request",
            FlowError::Dispatch(_) => "dispatch",
            FlowError::ChatSink(_) => "chat_sink",
        }
    }

    /// Fixed body returned to the caller.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::MISDIRECTED_REQUEST => "Decryption failed",
            StatusCode::BAD_REQUEST => "Bad request",
            StatusCode::PAYLOAD_TOO_LARGE => "Payload too large",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal error",
            _ => "Invalid signature",
        }
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain")],
            self.public_message(),
        )
            .into_response();
        response
            .extensions_mut()
            .insert(FlowOutcome::Failed(self.failure_class()));
        response
    }
}

/// Chat event sink failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatSinkError {
    /// The sink could not accept the event.
    #[error("{0}")]
    Rejected(String),
}

/// Gateway-level errors (startup and serving)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_status_mapping() {
        let cases = [
            (CodecError::KeyUnwrapFailure("oaep".into()), 421),
            (CodecError::PayloadAuthenticationFailure, 421),
            (CodecError::MalformedEnvelope("nonce".into()), 400),
            (CodecError::MalformedPlaintext("json".into()), 400),
            (CodecError::EncryptionFailed("aes".into()), 500),
        ];
        for (error, status) in cases {
            assert_eq!(FlowError::from(error).status().as_u16(), status);
        }
    }

    #[test]
    fn test_signature_status_is_432() {
        assert_eq!(FlowError::SignatureMismatch.status().as_u16(), 432);
        assert_eq!(FlowError::SignatureMismatch.public_message(), "Invalid signature");
    }

    #[test]
    fn test_dispatch_mapping() {
        let bad = FlowError::from(DispatchError::InvalidRequest("no action".into()));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let internal = FlowError::from(DispatchError::ReferenceData("down".into()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_carries_failure_class() {
        let response =
            FlowError::from(CodecError::PayloadAuthenticationFailure).into_response();
        assert_eq!(response.status(), StatusCode::MISDIRECTED_REQUEST);
        assert_eq!(
            response.extensions().get::<FlowOutcome>(),
            Some(&FlowOutcome::Failed("payload_authentication"))
        );

        let response = FlowError::SignatureMismatch.into_response();
        assert_eq!(
            response.extensions().get::<FlowOutcome>(),
            Some(&FlowOutcome::Failed("signature_mismatch"))
        );
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = FlowError::from(CodecError::KeyUnwrapFailure("secret detail".into()));
        assert_eq!(err.public_message(), "Decryption failed");
        assert!(!err.public_message().contains("secret"));
    }
}
