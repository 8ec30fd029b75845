// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cryptographic Engine
//!
//! All operations use the audited `ring` crate: ephemeral P-256 ECDH,
//! HKDF-SHA256 key derivation, and AES-256-GCM authenticated encryption.
//! Every operation is a pure, synchronous transform safe to run inside a
//! transport event callback.

pub mod agreement;
pub mod encryption;
pub mod kdf;

pub use agreement::{AgreementError, EphemeralKeyPair, SharedSecret};
pub use encryption::{
    decrypt, encrypt, EncryptionError, SessionKey, MIN_SEALED_SIZE, NONCE_SIZE, TAG_SIZE,
};
pub use kdf::{KDFError, HKDF, SESSION_KEY_INFO, SESSION_KEY_SALT};
