//! Authenticated encryption envelopes.
//!
//! XChaCha20-Poly1305 with a fresh 24-byte random nonce per call. The
//! envelope carries version, nonce, tag, and ciphertext explicitly; there
//! is no implicit state beyond the key. Decryption of anything tampered or
//! truncated fails closed.

use chacha20poly1305::aead::Aead;
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use pulse_core::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Envelope wire version.
const VERSION: u8 = 1;

/// XChaCha20 nonce length in bytes.
const NONCE_LEN: usize = 24;

/// Poly1305 tag length in bytes.
const TAG_LEN: usize = 16;

/// A self-describing ciphertext envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    pub version: u8,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl CipherEnvelope {
    /// Compact text encoding: `spv1:<nonce>:<tag>:<ciphertext>`, hex fields.
    pub fn encode(&self) -> String {
        format!(
            "spv{}:{}:{}:{}",
            self.version,
            hex::encode(&self.nonce),
            hex::encode(&self.tag),
            hex::encode(&self.ciphertext)
        )
    }

    /// Parses the compact text encoding.
    pub fn decode(input: &str) -> Result<Self> {
        let mut parts = input.split(':');
        let version = match parts.next() {
            Some("spv1") => VERSION,
            _ => return Err(Error::crypto("unsupported envelope version")),
        };

        let mut field = |name: &str| -> Result<Vec<u8>> {
            let raw = parts
                .next()
                .ok_or_else(|| Error::crypto(format!("envelope missing {name}")))?;
            hex::decode(raw).map_err(|_| Error::crypto(format!("envelope {name} is not hex")))
        };

        let nonce = field("nonce")?;
        let tag = field("tag")?;
        let ciphertext = field("ciphertext")?;

        if parts.next().is_some() {
            return Err(Error::crypto("trailing envelope data"));
        }
        if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(Error::crypto("envelope field length mismatch"));
        }

        Ok(Self {
            version,
            nonce,
            tag,
            ciphertext,
        })
    }
}

/// Encrypts `plaintext`, generating a fresh nonce.
pub(crate) fn seal(cipher: &XChaCha20Poly1305, plaintext: &[u8]) -> Result<CipherEnvelope> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let mut sealed = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::crypto("encryption failed"))?;

    // The AEAD appends the tag; split it out so the envelope is explicit.
    let tag = sealed.split_off(sealed.len() - TAG_LEN);

    Ok(CipherEnvelope {
        version: VERSION,
        nonce: nonce.to_vec(),
        tag,
        ciphertext: sealed,
    })
}

/// Decrypts an envelope. Any authentication failure is an error, never
/// garbage plaintext.
pub(crate) fn open(cipher: &XChaCha20Poly1305, env: &CipherEnvelope) -> Result<Vec<u8>> {
    if env.version != VERSION {
        return Err(Error::crypto("unsupported envelope version"));
    }
    if env.nonce.len() != NONCE_LEN || env.tag.len() != TAG_LEN {
        return Err(Error::crypto("envelope field length mismatch"));
    }

    let mut sealed = Vec::with_capacity(env.ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(&env.ciphertext);
    sealed.extend_from_slice(&env.tag);

    cipher
        .decrypt(XNonce::from_slice(&env.nonce), sealed.as_slice())
        .map_err(|_| Error::crypto("envelope authentication failed"))
}
