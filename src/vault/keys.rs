// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Vault key-wrap layer keys.
//!
//! The vault envelope uses two independent AES-256-GCM key-wrap layers.
//! Both layer keys are process-wide state: loaded once at startup from
//! the environment (fed by the secret store), held only inside
//! [`VaultKeys`], and zeroed from memory on drop. They are never written
//! to the audit ledger, any record, or any log line.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{VAULT_KEY_INNER_ENV, VAULT_KEY_OUTER_ENV};

/// Length of a key-wrap layer key in bytes (256 bits).
pub const LAYER_KEY_LEN: usize = 32;

/// Errors loading key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("layer key is not valid base64")]
    Decode,
    #[error("layer key must be {LAYER_KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// One AES-256-GCM key-wrap layer key.
///
/// Key material is securely zeroed from memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct LayerKey {
    key: [u8; LAYER_KEY_LEN],
}

impl LayerKey {
    /// Generate a random layer key using the OS CSPRNG.
    ///
    /// # Panics
    ///
    /// Panics if the OS CSPRNG fails (catastrophic system error).
    pub fn generate() -> Self {
        let mut key = [0u8; LAYER_KEY_LEN];
        getrandom::fill(&mut key).expect("CSPRNG failure");
        Self { key }
    }

    /// Wrap raw bytes as a key handle (used for the per-payload data key).
    pub(crate) fn from_raw(key: [u8; LAYER_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Restore a layer key from its base64 representation.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|_| KeyError::Decode)?;
        if bytes.len() != LAYER_KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut key = [0u8; LAYER_KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Raw key material. Handle with care; never log or persist.
    pub(crate) fn as_bytes(&self) -> &[u8; LAYER_KEY_LEN] {
        &self.key
    }
}

/// The two independent key-wrap layer keys used by the vault envelope.
///
/// Compromise of a single layer's key material does not expose any
/// stored plaintext.
pub struct VaultKeys {
    outer: LayerKey,
    inner: LayerKey,
}

impl VaultKeys {
    /// Build from explicit layer keys.
    pub fn new(outer: LayerKey, inner: LayerKey) -> Self {
        Self { outer, inner }
    }

    /// Load layer keys from the environment.
    ///
    /// When either variable is unset, an ephemeral random key is used and
    /// a warning is logged: records sealed with ephemeral keys cannot be
    /// opened after a restart, so this mode is for development only.
    pub fn from_env() -> Result<Self, KeyError> {
        let outer = match std::env::var(VAULT_KEY_OUTER_ENV) {
            Ok(encoded) => LayerKey::from_base64(&encoded)?,
            Err(_) => {
                tracing::warn!(
                    "{VAULT_KEY_OUTER_ENV} not set, using ephemeral outer layer key (dev only)"
                );
                LayerKey::generate()
            }
        };
        let inner = match std::env::var(VAULT_KEY_INNER_ENV) {
            Ok(encoded) => LayerKey::from_base64(&encoded)?,
            Err(_) => {
                tracing::warn!(
                    "{VAULT_KEY_INNER_ENV} not set, using ephemeral inner layer key (dev only)"
                );
                LayerKey::generate()
            }
        };
        Ok(Self::new(outer, inner))
    }

    /// Ephemeral random keys for tests.
    pub fn ephemeral() -> Self {
        Self::new(LayerKey::generate(), LayerKey::generate())
    }

    pub(crate) fn outer(&self) -> &LayerKey {
        &self.outer
    }

    pub(crate) fn inner(&self) -> &LayerKey {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_keys() {
        let a = LayerKey::generate();
        let b = LayerKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn base64_roundtrip() {
        let key = LayerKey::generate();
        let encoded = BASE64.encode(key.as_bytes());
        let restored = LayerKey::from_base64(&encoded).unwrap();
        assert_eq!(key.as_bytes(), restored.as_bytes());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let encoded = BASE64.encode(b"short");
        assert!(matches!(
            LayerKey::from_base64(&encoded),
            Err(KeyError::InvalidLength(5))
        ));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(
            LayerKey::from_base64("not-base64!!!"),
            Err(KeyError::Decode)
        ));
    }
}
