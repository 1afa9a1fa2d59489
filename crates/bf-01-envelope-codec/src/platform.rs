//! # Platform Side
//!
//! What the messaging platform does on its end: seal a request under our
//! public key, open our response. Used by tests and local tooling to drive
//! the service without the real platform.

use crate::envelope::EncryptedEnvelope;
use crate::keys::SessionKeys;
use crate::symmetric;
use crate::CodecError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::{Oaep, RsaPublicKey};
use serde::Serialize;
use sha2::Sha256;

/// A sealed request plus the key material the platform keeps to open the
/// reply.
#[derive(Debug)]
pub struct SealedRequest {
    /// Envelope to POST.
    pub envelope: EncryptedEnvelope,
    /// Key and nonce used.
    pub keys: SessionKeys,
}

/// RSA-OAEP wrap of the session key.
///
/// # Errors
///
/// Returns `CodecError::EncryptionFailed` if OAEP encryption fails.
pub fn wrap_key(public_key: &RsaPublicKey, keys: &SessionKeys) -> Result<Vec<u8>, CodecError> {
    public_key
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), keys.key())
        .map_err(|e| CodecError::EncryptionFailed(format!("oaep: {e}")))
}

/// Seal a request with a fresh key and nonce.
///
/// # Errors
///
/// Returns `CodecError::EncryptionFailed` on serialisation or cipher
/// failure.
pub fn seal_request<T: Serialize + ?Sized>(
    public_key: &RsaPublicKey,
    request: &T,
) -> Result<SealedRequest, CodecError> {
    seal_request_with(public_key, request, SessionKeys::generate())
}

/// Seal a request with caller-chosen key material.
///
/// # Errors
///
/// Returns `CodecError::EncryptionFailed` on serialisation or cipher
/// failure.
pub fn seal_request_with<T: Serialize + ?Sized>(
    public_key: &RsaPublicKey,
    request: &T,
    keys: SessionKeys,
) -> Result<SealedRequest, CodecError> {
    let json =
        serde_json::to_vec(request).map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

    let wrapped = wrap_key(public_key, &keys)?;
    let payload = symmetric::seal(keys.key(), keys.request_nonce(), &json)?;

    Ok(SealedRequest {
        envelope: EncryptedEnvelope::from_parts(&wrapped, &payload, keys.request_nonce()),
        keys,
    })
}

/// Open a response body produced by [`crate::encrypt_response`].
///
/// # Errors
///
/// - `MalformedEnvelope`: body is not base64 or shorter than a tag
/// - `PayloadAuthenticationFailure`: tag mismatch (e.g. wrong nonce)
/// - `MalformedPlaintext`: plaintext is not JSON
pub fn open_response(body: &str, keys: &SessionKeys) -> Result<serde_json::Value, CodecError> {
    let raw = STANDARD
        .decode(body.trim())
        .map_err(|e| CodecError::MalformedEnvelope(format!("response is not base64: {e}")))?;

    let plaintext = symmetric::open(keys.key(), &keys.response_nonce(), &raw)?;
    serde_json::from_slice(&plaintext).map_err(|e| CodecError::MalformedPlaintext(e.to_string()))
}
