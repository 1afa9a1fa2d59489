//! # Envelope Types
//!
//! Wire-level request envelope and the decrypted result.

use crate::keys::{SessionKeys, NONCE_LEN};
use crate::CodecError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// JSON field carrying the wrapped AES key.
pub const FIELD_WRAPPED_KEY: &str = "encrypted_aes_key";
/// JSON field carrying `ciphertext ‖ tag`.
pub const FIELD_CIPHER_PAYLOAD: &str = "encrypted_flow_data";
/// JSON field carrying the request nonce.
pub const FIELD_NONCE: &str = "initial_vector";

/// Inbound encrypted envelope. All fields are base64.
///
/// Missing fields deserialize as empty strings so that absence surfaces as
/// `MalformedEnvelope` from [`EncryptedEnvelope::decode`] rather than as a
/// serde error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// AES key encrypted under the service's public key.
    #[serde(
        rename = "encrypted_aes_key",
        alias = "wrappedKey",
        alias = "wrapped_key",
        default
    )]
    pub wrapped_key: String,

    /// AES-GCM ciphertext with the 16-byte tag appended.
    #[serde(
        rename = "encrypted_flow_data",
        alias = "cipherPayload",
        alias = "cipher_payload",
        default
    )]
    pub cipher_payload: String,

    /// 16-byte nonce used for the request payload.
    #[serde(rename = "initial_vector", alias = "nonce", default)]
    pub nonce: String,
}

/// Envelope after base64 decoding and length checks.
pub(crate) struct DecodedEnvelope {
    pub(crate) wrapped_key: Vec<u8>,
    pub(crate) cipher_payload: Vec<u8>,
    pub(crate) nonce: [u8; NONCE_LEN],
}

impl EncryptedEnvelope {
    /// Build from raw bytes (platform side).
    pub fn from_parts(wrapped_key: &[u8], cipher_payload: &[u8], nonce: &[u8]) -> Self {
        Self {
            wrapped_key: STANDARD.encode(wrapped_key),
            cipher_payload: STANDARD.encode(cipher_payload),
            nonce: STANDARD.encode(nonce),
        }
    }

    /// True if a JSON object carries at least one envelope field.
    ///
    /// Used to tell encrypted flow submissions apart from plain chat events.
    pub fn looks_like_envelope(body: &serde_json::Value) -> bool {
        let aliases = [
            FIELD_WRAPPED_KEY,
            FIELD_CIPHER_PAYLOAD,
            FIELD_NONCE,
            "wrappedKey",
            "wrapped_key",
            "cipherPayload",
            "cipher_payload",
            "nonce",
        ];
        body.as_object()
            .map(|map| aliases.iter().any(|name| map.contains_key(*name)))
            .unwrap_or(false)
    }

    pub(crate) fn decode(&self) -> Result<DecodedEnvelope, CodecError> {
        let wrapped_key = decode_field(FIELD_WRAPPED_KEY, &self.wrapped_key)?;
        let cipher_payload = decode_field(FIELD_CIPHER_PAYLOAD, &self.cipher_payload)?;
        let raw_nonce = decode_field(FIELD_NONCE, &self.nonce)?;

        let nonce: [u8; NONCE_LEN] = raw_nonce.as_slice().try_into().map_err(|_| {
            CodecError::MalformedEnvelope(format!(
                "{FIELD_NONCE} is {} bytes, expected {NONCE_LEN}",
                raw_nonce.len()
            ))
        })?;

        Ok(DecodedEnvelope {
            wrapped_key,
            cipher_payload,
            nonce,
        })
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, CodecError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CodecError::MalformedEnvelope(format!("{name} is missing")));
    }

    let bytes = STANDARD
        .decode(value)
        .map_err(|e| CodecError::MalformedEnvelope(format!("{name} is not base64: {e}")))?;

    if bytes.is_empty() {
        return Err(CodecError::MalformedEnvelope(format!("{name} is empty")));
    }
    Ok(bytes)
}

/// Result of a successful decrypt.
pub struct DecryptedEnvelope {
    /// Parsed request JSON.
    pub plaintext: serde_json::Value,
    /// Key material needed to seal the response.
    pub keys: SessionKeys,
}

impl std::fmt::Debug for DecryptedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedEnvelope")
            .field("plaintext", &"<redacted>")
            .field("keys", &self.keys)
            .finish()
    }
}
