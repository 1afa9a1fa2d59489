//! Codec error types.
//!
//! Every variant is fatal for the request that produced it. The classes are
//! kept apart so the gateway can tell a stale platform key from a corrupted
//! or malformed request.

use thiserror::Error;

/// Envelope codec errors.
///
/// Messages never carry key material or plaintext.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Envelope field missing, empty, not base64, or of the wrong size.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// RSA-OAEP unwrap failed, or the private key itself could not be loaded.
    #[error("Key unwrap failed: {0}")]
    KeyUnwrapFailure(String),

    /// AES-GCM tag did not verify.
    #[error("Payload authentication failed")]
    PayloadAuthenticationFailure,

    /// Decrypted bytes are not UTF-8 JSON.
    #[error("Malformed plaintext: {0}")]
    MalformedPlaintext(String),

    /// Response serialisation or encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

/// Coarse failure class, used for status mapping and metric labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// `MalformedEnvelope`
    MalformedEnvelope,
    /// `KeyUnwrapFailure`
    KeyUnwrap,
    /// `PayloadAuthenticationFailure`
    PayloadAuthentication,
    /// `MalformedPlaintext`
    MalformedPlaintext,
    /// `EncryptionFailed`
    Encryption,
}

impl FailureClass {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::MalformedEnvelope => "malformed_envelope",
            FailureClass::KeyUnwrap => "key_unwrap",
            FailureClass::PayloadAuthentication => "payload_authentication",
            FailureClass::MalformedPlaintext => "malformed_plaintext",
            FailureClass::Encryption => "encryption",
        }
    }
}

impl CodecError {
    /// Failure class of this error.
    pub fn class(&self) -> FailureClass {
        match self {
            CodecError::MalformedEnvelope(_) => FailureClass::MalformedEnvelope,
            CodecError::KeyUnwrapFailure(_) => FailureClass::KeyUnwrap,
            CodecError::PayloadAuthenticationFailure => FailureClass::PayloadAuthentication,
            CodecError::MalformedPlaintext(_) => FailureClass::MalformedPlaintext,
            CodecError::EncryptionFailed(_) => FailureClass::Encryption,
        }
    }

    /// True when the platform should re-fetch our public key.
    ///
    /// A payload that fails authentication was either tampered with or
    /// sealed under a key we cannot recover, so it is reported the same way
    /// as an unwrap failure.
    pub fn is_key_stale(&self) -> bool {
        matches!(
            self,
            CodecError::KeyUnwrapFailure(_) | CodecError::PayloadAuthenticationFailure
        )
    }

    /// True when the request itself is structurally unusable.
    pub fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            CodecError::MalformedEnvelope(_) | CodecError::MalformedPlaintext(_)
        )
    }
}
