// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HKDF-SHA256 Key Derivation (RFC 5869)
//!
//! Extract-then-expand derivation used to turn an ECDH shared secret into
//! a fixed-length session key. Deterministic: identical inputs always
//! produce identical output, so golden test vectors apply.

use ring::hmac;
use thiserror::Error;

use super::agreement::SharedSecret;
use super::encryption::SessionKey;

/// SHA-256 output length in bytes.
const HASH_LEN: usize = 32;

/// Salt for session key derivation (fixed by the wire protocol).
pub const SESSION_KEY_SALT: &[u8] = b"salt";

/// Context string for session key derivation (fixed by the wire protocol).
pub const SESSION_KEY_INFO: &[u8] = b"nearby-p2p";

/// Key derivation error types.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KDFError {
    #[error("Requested output length exceeds HKDF maximum (255 * 32 bytes)")]
    OutputTooLong,
}

/// HKDF-SHA256 implementation.
pub struct HKDF;

impl HKDF {
    /// HKDF-Extract: produces a pseudorandom key from salt and input key material.
    ///
    /// A missing salt is equivalent to a zero-filled salt of hash length.
    pub fn extract(salt: Option<&[u8]>, ikm: &[u8]) -> Vec<u8> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, salt.unwrap_or(&[]));
        hmac::sign(&key, ikm).as_ref().to_vec()
    }

    /// HKDF-Expand: stretches a pseudorandom key to `length` output bytes.
    ///
    /// Each block feeds the previous block, `info`, and a 1-byte counter
    /// (starting at 1) back into HMAC; the concatenation is truncated to
    /// the requested length.
    pub fn expand(prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>, KDFError> {
        if length > 255 * HASH_LEN {
            return Err(KDFError::OutputTooLong);
        }

        let key = hmac::Key::new(hmac::HMAC_SHA256, prk);
        let mut okm = Vec::with_capacity(length);
        let mut block: Vec<u8> = Vec::new();
        let mut counter: u8 = 1;

        while okm.len() < length {
            let mut ctx = hmac::Context::with_key(&key);
            ctx.update(&block);
            ctx.update(info);
            ctx.update(&[counter]);
            block = ctx.sign().as_ref().to_vec();

            let take = (length - okm.len()).min(HASH_LEN);
            okm.extend_from_slice(&block[..take]);
            counter = counter.wrapping_add(1);
        }

        Ok(okm)
    }

    /// Convenience: extract followed by expand.
    pub fn derive(
        salt: Option<&[u8]>,
        ikm: &[u8],
        info: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, KDFError> {
        let prk = Self::extract(salt, ikm);
        Self::expand(&prk, info, length)
    }

    /// Derives the 32-byte session key from an ECDH shared secret using the
    /// protocol's fixed salt and context.
    pub fn derive_session_key(shared: &SharedSecret) -> SessionKey {
        let okm = Self::derive(
            Some(SESSION_KEY_SALT),
            shared.as_bytes(),
            SESSION_KEY_INFO,
            HASH_LEN,
        )
        .expect("32 bytes is within the HKDF output bound");

        let mut key = [0u8; 32];
        key.copy_from_slice(&okm);
        SessionKey::from_bytes(key)
    }
}
