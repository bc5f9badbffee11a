//! Pure PII transforms for the SitePulse analytics core.
//!
//! Three families, all stateless beyond key material:
//! - pseudonymization: one-way IP coarsening, no randomness
//! - keyed hashing: HMAC-SHA256, stable for equality joins
//! - envelopes: authenticated encryption that fails closed

pub mod envelope;
pub mod hashing;
pub mod pseudonym;
pub mod secrets;

pub use envelope::CipherEnvelope;
pub use pseudonym::pseudonymize_ip;
pub use secrets::{EnvSecrets, SecretProvider, StaticSecrets};

use chacha20poly1305::{Key, KeyInit, XChaCha20Poly1305};
use pulse_core::{Posture, Result};

/// PII transform handle holding derived key material.
///
/// Construct once at startup and share. The functions themselves are pure:
/// same input and same secrets always produce the same hash, and envelopes
/// are self-describing.
#[derive(Clone)]
pub struct Pii {
    hash_secret: Vec<u8>,
    cipher: XChaCha20Poly1305,
}

impl Pii {
    /// Builds the transform from a secret provider.
    ///
    /// Missing or malformed secrets are fatal when the posture requires
    /// them; otherwise an ephemeral key is generated and a warning logged
    /// (previously written envelopes become undecryptable).
    pub fn new(provider: &dyn SecretProvider, posture: Posture) -> Result<Self> {
        let key = secrets::encryption_key_or_fallback(provider, posture)?;
        let hash_secret = secrets::hash_secret_or_fallback(provider, posture)?;

        Ok(Self {
            hash_secret,
            cipher: XChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    /// Keyed hash of a value, lowercase hex.
    ///
    /// Rotating the hash secret invalidates every previously stored hash.
    pub fn hash(&self, value: &str) -> String {
        hashing::hmac_hex(&self.hash_secret, value.as_bytes())
    }

    /// Encrypts plaintext under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<CipherEnvelope> {
        envelope::seal(&self.cipher, plaintext.as_bytes())
    }

    /// Decrypts an envelope, failing closed on any tampering.
    pub fn decrypt(&self, env: &CipherEnvelope) -> Result<String> {
        let bytes = envelope::open(&self.cipher, env)?;
        String::from_utf8(bytes).map_err(|_| pulse_core::Error::crypto("plaintext is not utf-8"))
    }
}
