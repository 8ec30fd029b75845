// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Encryption (AES-256-GCM)
//!
//! Authenticated encryption under a per-connection session key.
//!
//! Wire format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! The nonce is freshly random per call; nonce reuse under one key cannot
//! occur because each connection derives a fresh key and encrypts a single
//! request/response pair.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroize;

/// Nonce size for AES-256-GCM (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;
/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;
/// Smallest frame a receiver will attempt to decrypt: nonce plus at least
/// one ciphertext byte. Anything shorter is rejected as malformed.
pub const MIN_SEALED_SIZE: usize = NONCE_SIZE + 1;

/// Decryption error types.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Ciphertext shorter than the authentication tag")]
    CiphertextTooShort,
    #[error("Authentication failed: data was tampered with or the key is wrong")]
    AuthenticationFailed,
}

/// 256-bit session key derived once per connection, never persisted.
#[derive(Clone)]
pub struct SessionKey {
    bytes: [u8; 32],
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SessionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SessionKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SessionKey { bytes }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// Encrypts a plaintext under the session key.
///
/// Output format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
pub fn encrypt(key: &SessionKey, plaintext: &[u8]) -> Vec<u8> {
    let rng = SystemRandom::new();

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rng.fill(&mut nonce_bytes)
        .expect("System RNG should not fail");

    let unbound_key =
        UnboundKey::new(&AES_256_GCM, key.as_bytes()).expect("Session key is 32 bytes");
    let sealing_key = LessSafeKey::new(unbound_key);

    let mut in_out = plaintext.to_vec();
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);
    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .expect("AES-GCM sealing should not fail");

    let mut output = Vec::with_capacity(NONCE_SIZE + in_out.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&in_out);
    output
}

/// Decrypts a `nonce || ciphertext` frame under the session key.
///
/// Fails with [`EncryptionError::AuthenticationFailed`] on tag mismatch and
/// with [`EncryptionError::CiphertextTooShort`] on truncated input. Neither
/// is retryable: both are the sole signal of tampering or corruption.
pub fn decrypt(key: &SessionKey, sealed: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let nonce_bytes: [u8; NONCE_SIZE] = sealed[..NONCE_SIZE]
        .try_into()
        .expect("Slice length checked above");
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let unbound_key =
        UnboundKey::new(&AES_256_GCM, key.as_bytes()).expect("Session key is 32 bytes");
    let opening_key = LessSafeKey::new(unbound_key);

    let mut buffer = sealed[NONCE_SIZE..].to_vec();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut buffer)
        .map_err(|_| EncryptionError::AuthenticationFailed)?;

    Ok(plaintext.to_vec())
}
