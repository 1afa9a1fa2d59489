//! PEM fixtures for tests.
//!
//! Two unrelated 2048-bit keys: the service key (in three encodings) and a
//! "stale" key standing in for an outdated copy held by the platform.

use crate::PrivateKeyMaterial;
use std::sync::OnceLock;

/// Service key, PKCS#8.
pub const SERVICE_KEY_PEM: &str = include_str!("../tests/fixtures/service_key.pem");

/// Service key, PKCS#1.
pub const SERVICE_KEY_PKCS1_PEM: &str = include_str!("../tests/fixtures/service_key_pkcs1.pem");

/// Service key, encrypted PKCS#8 (PBES2, AES-256-CBC).
pub const SERVICE_KEY_ENCRYPTED_PEM: &str =
    include_str!("../tests/fixtures/service_key_encrypted.pem");

/// Passphrase for [`SERVICE_KEY_ENCRYPTED_PEM`].
pub const SERVICE_KEY_PASSPHRASE: &str = "correct-horse";

/// A key unrelated to the service key.
pub const STALE_KEY_PEM: &str = include_str!("../tests/fixtures/stale_key.pem");

/// Parsed service key, shared across tests.
#[allow(clippy::expect_used)]
pub fn service_key() -> &'static PrivateKeyMaterial {
    static KEY: OnceLock<PrivateKeyMaterial> = OnceLock::new();
    KEY.get_or_init(|| {
        PrivateKeyMaterial::from_pem(SERVICE_KEY_PEM, None).expect("service key fixture parses")
    })
}

/// Parsed stale key, shared across tests.
#[allow(clippy::expect_used)]
pub fn stale_key() -> &'static PrivateKeyMaterial {
    static KEY: OnceLock<PrivateKeyMaterial> = OnceLock::new();
    KEY.get_or_init(|| {
        PrivateKeyMaterial::from_pem(STALE_KEY_PEM, None).expect("stale key fixture parses")
    })
}
