//! # Codec
//!
//! Request decrypt and response encrypt.

use crate::envelope::{DecryptedEnvelope, EncryptedEnvelope};
use crate::keys::{PrivateKeyMaterial, SessionKeys};
use crate::symmetric;
use crate::CodecError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use zeroize::Zeroizing;

/// Decrypt an inbound envelope.
///
/// Steps: base64 decode, RSA-OAEP unwrap, AES-GCM open with the detached
/// tag, JSON parse.
///
/// # Errors
///
/// - `MalformedEnvelope`: missing/empty field, bad base64, wrong nonce size,
///   payload shorter than the tag
/// - `KeyUnwrapFailure`: OAEP failure or wrong unwrapped key size
/// - `PayloadAuthenticationFailure`: tag mismatch
/// - `MalformedPlaintext`: plaintext is not UTF-8 JSON
pub fn decrypt_envelope(
    envelope: &EncryptedEnvelope,
    private_key: &PrivateKeyMaterial,
) -> Result<DecryptedEnvelope, CodecError> {
    let decoded = envelope.decode()?;

    let keys = SessionKeys::new(private_key.unwrap_key(&decoded.wrapped_key)?, decoded.nonce);

    let plaintext = Zeroizing::new(symmetric::open(
        keys.key(),
        keys.request_nonce(),
        &decoded.cipher_payload,
    )?);

    let text = std::str::from_utf8(&plaintext)
        .map_err(|e| CodecError::MalformedPlaintext(format!("not utf-8: {e}")))?;
    let plaintext = serde_json::from_str(text)
        .map_err(|e| CodecError::MalformedPlaintext(format!("not json: {e}")))?;

    tracing::trace!("envelope decrypted");
    Ok(DecryptedEnvelope { plaintext, keys })
}

/// Encrypt a response for the platform.
///
/// The nonce is the bit-inverted request nonce. Output is
/// `base64(ciphertext ‖ tag)`.
///
/// # Errors
///
/// Returns `CodecError::EncryptionFailed` if serialisation or encryption
/// fails.
pub fn encrypt_response<T: Serialize + ?Sized>(
    response: &T,
    keys: &SessionKeys,
) -> Result<String, CodecError> {
    let json = Zeroizing::new(
        serde_json::to_vec(response).map_err(|e| CodecError::EncryptionFailed(e.to_string()))?,
    );

    let sealed = symmetric::seal(keys.key(), &keys.response_nonce(), &json)?;
    Ok(STANDARD.encode(sealed))
}
