// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Layered encryption envelope for identity payloads.
//!
//! Each payload is encrypted with a fresh random data key
//! (AES-256-GCM). The data key is then wrapped by the inner layer key,
//! and that wrap is wrapped again by the outer layer key:
//!
//! ```text
//! ciphertext = AES-GCM(data_key,  payload)
//! wrap_1     = AES-GCM(inner_key, data_key)
//! wrap_2     = AES-GCM(outer_key, wrap_1)      # stored
//! ```
//!
//! Opening the envelope requires BOTH layer keys, so compromise of a
//! single layer's key material exposes nothing. All nonces are random
//! per seal. Fields are persisted as base64 inside the record JSON; the
//! data key and intermediate wraps are zeroed after use.

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::keys::{LayerKey, VaultKeys, LAYER_KEY_LEN};

/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Number of independent key-wrap layers in the envelope.
pub const LAYER_COUNT: u8 = 2;

/// Errors sealing or opening an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// A stored field is not valid base64 or has the wrong length.
    #[error("envelope field is malformed")]
    Malformed,
    /// Authentication failed: wrong key material or tampered ciphertext.
    #[error("envelope integrity check failed")]
    Integrity,
    /// Envelope was sealed with an unsupported layer count.
    #[error("unsupported layer count: {0}")]
    UnsupportedLayerCount(u8),
}

/// A sealed identity payload as persisted inside the record JSON.
///
/// Contains no plaintext and no key material: only the payload
/// ciphertext, the doubly-wrapped data key, and the nonces needed to
/// open each layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// Number of key-wrap layers (currently always 2).
    pub layer_count: u8,
    /// Payload ciphertext (base64).
    ciphertext_b64: String,
    /// Nonce for the payload encryption (base64).
    data_nonce_b64: String,
    /// Data key wrapped by inner then outer layer (base64).
    wrapped_key_b64: String,
    /// Nonce for the inner wrap (base64).
    inner_nonce_b64: String,
    /// Nonce for the outer wrap (base64).
    outer_nonce_b64: String,
}

fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::fill(&mut nonce).expect("CSPRNG failure");
    nonce
}

fn cipher_for(key: &LayerKey) -> Aes256Gcm {
    Aes256Gcm::new_from_slice(key.as_bytes()).expect("layer keys are always 32 bytes")
}

fn encrypt_with(key: &LayerKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Vec<u8> {
    cipher_for(key)
        .encrypt(nonce.into(), plaintext)
        .expect("AES-GCM encryption cannot fail with valid inputs")
}

fn decrypt_with(
    key: &LayerKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    cipher_for(key)
        .decrypt(nonce.into(), ciphertext)
        .map_err(|_| EnvelopeError::Integrity)
}

fn decode_field(encoded: &str) -> Result<Vec<u8>, EnvelopeError> {
    BASE64.decode(encoded).map_err(|_| EnvelopeError::Malformed)
}

fn decode_nonce(encoded: &str) -> Result<[u8; NONCE_LEN], EnvelopeError> {
    let bytes = decode_field(encoded)?;
    bytes.try_into().map_err(|_| EnvelopeError::Malformed)
}

/// Seal a payload under the two key-wrap layers.
pub fn seal(keys: &VaultKeys, plaintext: &[u8]) -> SealedEnvelope {
    let mut data_key = [0u8; LAYER_KEY_LEN];
    getrandom::fill(&mut data_key).expect("CSPRNG failure");

    let data_nonce = random_nonce();
    let inner_nonce = random_nonce();
    let outer_nonce = random_nonce();

    let data_key_handle = LayerKey::from_raw(data_key);
    let ciphertext = encrypt_with(&data_key_handle, &data_nonce, plaintext);

    let mut inner_wrap = encrypt_with(keys.inner(), &inner_nonce, data_key_handle.as_bytes());
    let outer_wrap = encrypt_with(keys.outer(), &outer_nonce, &inner_wrap);
    inner_wrap.zeroize();
    data_key.zeroize();

    SealedEnvelope {
        layer_count: LAYER_COUNT,
        ciphertext_b64: BASE64.encode(&ciphertext),
        data_nonce_b64: BASE64.encode(data_nonce),
        wrapped_key_b64: BASE64.encode(&outer_wrap),
        inner_nonce_b64: BASE64.encode(inner_nonce),
        outer_nonce_b64: BASE64.encode(outer_nonce),
    }
}

/// Open a sealed envelope, returning the original plaintext.
///
/// Requires both layer keys; fails closed on any tampering or key
/// mismatch.
pub fn open(keys: &VaultKeys, envelope: &SealedEnvelope) -> Result<Vec<u8>, EnvelopeError> {
    if envelope.layer_count != LAYER_COUNT {
        return Err(EnvelopeError::UnsupportedLayerCount(envelope.layer_count));
    }

    let outer_wrap = decode_field(&envelope.wrapped_key_b64)?;
    let outer_nonce = decode_nonce(&envelope.outer_nonce_b64)?;
    let inner_nonce = decode_nonce(&envelope.inner_nonce_b64)?;
    let data_nonce = decode_nonce(&envelope.data_nonce_b64)?;
    let ciphertext = decode_field(&envelope.ciphertext_b64)?;

    let mut inner_wrap = decrypt_with(keys.outer(), &outer_nonce, &outer_wrap)?;
    let data_key_result = decrypt_with(keys.inner(), &inner_nonce, &inner_wrap);
    inner_wrap.zeroize();
    let mut data_key_bytes = data_key_result?;

    if data_key_bytes.len() != LAYER_KEY_LEN {
        data_key_bytes.zeroize();
        return Err(EnvelopeError::Malformed);
    }
    let mut key_array = [0u8; LAYER_KEY_LEN];
    key_array.copy_from_slice(&data_key_bytes);
    data_key_bytes.zeroize();

    let data_key = LayerKey::from_raw(key_array);
    decrypt_with(&data_key, &data_nonce, &ciphertext)
}
