//! # BF-01 Envelope Codec
//!
//! Authenticated transformation between the platform's encrypted flow
//! envelope and plaintext JSON.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Pure functions, no I/O beyond supplied key material
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `keys` | RSA-OAEP (SHA-256 / MGF1-SHA-256) | Per-request key unwrap |
//! | `symmetric` | AES-128-GCM, 128-bit nonce, detached tag | Payload encryption |
//! | `codec` | Both of the above | Request decrypt / response encrypt |
//! | `platform` | Mirror image of `codec` | Sealing requests, opening responses |
//!
//! ## Wire Contract
//!
//! ```text
//! request:  { encrypted_aes_key, encrypted_flow_data, initial_vector }   (base64)
//!           encrypted_flow_data = ciphertext ‖ tag[16]
//! response: base64( ciphertext ‖ tag[16] )
//!           response nonce = !request nonce (every byte bit-inverted)
//! ```
//!
//! The response nonce is a fixed platform convention. A fresh random nonce
//! is cryptographically valid and is still rejected by the platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod codec;
pub mod envelope;
pub mod errors;
pub mod keys;
pub mod platform;
pub mod symmetric;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

// Re-exports
pub use codec::{decrypt_envelope, encrypt_response};
pub use envelope::{DecryptedEnvelope, EncryptedEnvelope};
pub use errors::{CodecError, FailureClass};
pub use keys::{invert_nonce, PrivateKeyMaterial, SessionKeys, KEY_LEN, NONCE_LEN};
pub use platform::{open_response, seal_request, SealedRequest};
pub use symmetric::TAG_LEN;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
