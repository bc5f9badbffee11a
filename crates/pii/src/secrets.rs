//! Secret material for hashing and encryption.
//!
//! Secrets come from an external provider. In a production posture their
//! absence is fatal at startup; in development the transforms fall back to
//! ephemeral generated material with a logged warning.

use pulse_core::{Error, Posture, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::warn;

/// Required encryption key length in bytes (256-bit).
pub const KEY_LEN: usize = 32;

/// External source of key material.
pub trait SecretProvider: Send + Sync {
    /// 256-bit encryption key, or `None` when unconfigured.
    fn encryption_key(&self) -> Result<Option<[u8; KEY_LEN]>>;

    /// Hash secret, or `None` when unconfigured.
    fn hash_secret(&self) -> Result<Option<String>>;
}

/// Reads secrets from the environment.
///
/// `SITEPULSE_ENCRYPTION_KEY` is 64 hex chars; `SITEPULSE_HASH_SECRET` is
/// an opaque string.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn encryption_key(&self) -> Result<Option<[u8; KEY_LEN]>> {
        let raw = match std::env::var("SITEPULSE_ENCRYPTION_KEY") {
            Ok(v) if !v.is_empty() => v,
            _ => return Ok(None),
        };

        let bytes = hex::decode(raw.trim())
            .map_err(|_| Error::config("SITEPULSE_ENCRYPTION_KEY is not hex"))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            Error::config(format!(
                "SITEPULSE_ENCRYPTION_KEY must be {} hex chars",
                KEY_LEN * 2
            ))
        })?;

        Ok(Some(key))
    }

    fn hash_secret(&self) -> Result<Option<String>> {
        match std::env::var("SITEPULSE_HASH_SECRET") {
            Ok(v) if !v.is_empty() => Ok(Some(v)),
            _ => Ok(None),
        }
    }
}

/// Fixed secrets for tests and tooling.
#[derive(Debug, Clone)]
pub struct StaticSecrets {
    key: [u8; KEY_LEN],
    hash_secret: String,
}

impl StaticSecrets {
    pub fn new(key: [u8; KEY_LEN], hash_secret: impl Into<String>) -> Self {
        Self {
            key,
            hash_secret: hash_secret.into(),
        }
    }
}

impl SecretProvider for StaticSecrets {
    fn encryption_key(&self) -> Result<Option<[u8; KEY_LEN]>> {
        Ok(Some(self.key))
    }

    fn hash_secret(&self) -> Result<Option<String>> {
        Ok(Some(self.hash_secret.clone()))
    }
}

/// Resolves the encryption key per posture.
pub(crate) fn encryption_key_or_fallback(
    provider: &dyn SecretProvider,
    posture: Posture,
) -> Result<[u8; KEY_LEN]> {
    match provider.encryption_key()? {
        Some(key) => Ok(key),
        None if posture.secrets_required() => {
            Err(Error::config("encryption key is required in production"))
        }
        None => {
            warn!("no encryption key configured, using an ephemeral key; envelopes will not survive restart");
            let mut key = [0u8; KEY_LEN];
            OsRng.fill_bytes(&mut key);
            Ok(key)
        }
    }
}

/// Resolves the hash secret per posture.
pub(crate) fn hash_secret_or_fallback(
    provider: &dyn SecretProvider,
    posture: Posture,
) -> Result<Vec<u8>> {
    match provider.hash_secret()? {
        Some(secret) => Ok(secret.into_bytes()),
        None if posture.secrets_required() => {
            Err(Error::config("hash secret is required in production"))
        }
        None => {
            warn!("no hash secret configured, using an ephemeral secret; hashes will not survive restart");
            let mut secret = [0u8; KEY_LEN];
            OsRng.fill_bytes(&mut secret);
            Ok(secret.to_vec())
        }
    }
}
