//! # Symmetric Encryption
//!
//! AES-128-GCM with the platform's 128-bit nonce and a detached 16-byte tag.
//!
//! ## Security Properties
//!
//! - Tag is verified before any plaintext is released
//! - Nonces are supplied by the caller; this module never generates them

use crate::keys::{KEY_LEN, NONCE_LEN};
use crate::CodecError;
use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes128,
    AesGcm, Nonce, Tag,
};

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// AES-128-GCM with a 16-byte nonce.
type Aes128Gcm16 = AesGcm<Aes128, U16>;

/// Encrypt, returning `ciphertext ‖ tag`.
///
/// # Errors
///
/// Returns `CodecError::EncryptionFailed` if the cipher rejects the input.
pub fn seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let cipher = Aes128Gcm16::new_from_slice(key)
        .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(nonce), b"", &mut buffer)
        .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

    buffer.extend_from_slice(&tag);
    Ok(buffer)
}

/// Decrypt `ciphertext ‖ tag`.
///
/// # Errors
///
/// Returns `CodecError::MalformedEnvelope` if the input is shorter than a
/// tag, and `CodecError::PayloadAuthenticationFailure` if the tag does not
/// verify.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Vec<u8>, CodecError> {
    if sealed.len() < TAG_LEN {
        return Err(CodecError::MalformedEnvelope(format!(
            "payload is {} bytes, shorter than the {}-byte tag",
            sealed.len(),
            TAG_LEN
        )));
    }

    let (body, tag) = sealed.split_at(sealed.len() - TAG_LEN);
    let cipher = Aes128Gcm16::new_from_slice(key)
        .map_err(|_| CodecError::PayloadAuthenticationFailure)?;

    let mut buffer = body.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::<U16>::from_slice(tag),
        )
        .map_err(|_| CodecError::PayloadAuthenticationFailure)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [0x11; KEY_LEN];
    const NONCE: [u8; NONCE_LEN] = [0x22; NONCE_LEN];

    #[test]
    fn test_seal_open_roundtrip() {
        let plaintext = b"{\"screen\":\"APPOINTMENT\"}";
        let sealed = seal(&KEY, &NONCE, plaintext).unwrap();

        assert_eq!(sealed.len(), plaintext.len() + TAG_LEN);
        assert_eq!(open(&KEY, &NONCE, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_empty_plaintext_is_tag_only() {
        let sealed = seal(&KEY, &NONCE, b"").unwrap();
        assert_eq!(sealed.len(), TAG_LEN);
        assert!(open(&KEY, &NONCE, &sealed).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal(&KEY, &NONCE, b"Secret message").unwrap();
        let result = open(&[0x12; KEY_LEN], &NONCE, &sealed);
        assert!(matches!(result, Err(CodecError::PayloadAuthenticationFailure)));
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let sealed = seal(&KEY, &NONCE, b"Secret message").unwrap();
        let result = open(&KEY, &[0x23; NONCE_LEN], &sealed);
        assert!(matches!(result, Err(CodecError::PayloadAuthenticationFailure)));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let mut sealed = seal(&KEY, &NONCE, b"Secret message").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(
            open(&KEY, &NONCE, &sealed),
            Err(CodecError::PayloadAuthenticationFailure)
        ));
    }

    #[test]
    fn test_short_input_is_malformed() {
        let result = open(&KEY, &NONCE, &[0u8; TAG_LEN - 1]);
        assert!(matches!(result, Err(CodecError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_known_answer_is_stable() {
        // Same key, nonce and plaintext always give the same output.
        let a = seal(&KEY, &NONCE, b"ping").unwrap();
        let b = seal(&KEY, &NONCE, b"ping").unwrap();
        assert_eq!(hex::encode(a), hex::encode(b));
    }
}
