// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Ephemeral P-256 Key Agreement
//!
//! One key pair per connection attempt. The private half is consumed by the
//! agreement operation, so a pair can never be reused across connections;
//! the shared secret is zeroized when the connection context is dropped.

use ring::agreement::{self, EphemeralPrivateKey, UnparsedPublicKey, ECDH_P256};
use ring::rand::SystemRandom;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key agreement error types.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgreementError {
    #[error("Peer public key is malformed or not a valid curve point")]
    InvalidPeerKey,
}

/// An ECDH shared secret, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Returns the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedSecret").field(&"[REDACTED]").finish()
    }
}

/// An ephemeral P-256 key pair for a single connection attempt.
pub struct EphemeralKeyPair {
    private: EphemeralPrivateKey,
    public: Vec<u8>,
}

impl EphemeralKeyPair {
    /// Generates a fresh key pair.
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let private = EphemeralPrivateKey::generate(&ECDH_P256, &rng)
            .expect("System RNG should not fail");
        let public = private
            .compute_public_key()
            .expect("Public key computation should not fail")
            .as_ref()
            .to_vec();

        EphemeralKeyPair { private, public }
    }

    /// Returns the public key in uncompressed point encoding (65 bytes).
    pub fn public_bytes(&self) -> &[u8] {
        &self.public
    }

    /// Performs ECDH with the peer's encoded public key, consuming the
    /// private half.
    ///
    /// Fails with [`AgreementError::InvalidPeerKey`] on malformed or
    /// off-curve input; the caller must abort the connection rather than
    /// retry with the same bytes.
    pub fn agree(self, peer_public: &[u8]) -> Result<SharedSecret, AgreementError> {
        let peer = UnparsedPublicKey::new(&ECDH_P256, peer_public);
        agreement::agree_ephemeral(self.private, &peer, |secret| {
            SharedSecret(secret.to_vec())
        })
        .map_err(|_| AgreementError::InvalidPeerKey)
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &hex::encode(&self.public))
            .finish()
    }
}
