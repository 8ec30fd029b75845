// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exchange Error Types

use thiserror::Error;

use super::EnvelopeError;
use crate::crypto::{AgreementError, EncryptionError};

/// Errors that can occur during a proximity exchange.
///
/// Every error is terminal for its connection: the initiator never retries
/// within one fetch attempt, and the responder isolates the failure to the
/// offending peer's context. [`ExchangeError::RateLimited`] exists only
/// inside the responder; on the wire it is indistinguishable from a
/// malformed-payload drop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Malformed envelope or frame")]
    MalformedEnvelope,

    #[error("Peer public key rejected")]
    InvalidPeerKey,

    #[error("Payload failed authentication")]
    AuthenticationFailed,

    #[error("Exchange timed out")]
    Timeout,

    #[error("Transport operation failed")]
    TransportFailure,

    #[error("Request denied by rate limiter")]
    RateLimited,

    #[error("Unexpected envelope type: {0}")]
    UnexpectedEnvelope(String),
}

impl From<EnvelopeError> for ExchangeError {
    fn from(_: EnvelopeError) -> Self {
        ExchangeError::MalformedEnvelope
    }
}

impl From<AgreementError> for ExchangeError {
    fn from(_: AgreementError) -> Self {
        ExchangeError::InvalidPeerKey
    }
}

impl From<EncryptionError> for ExchangeError {
    fn from(_: EncryptionError) -> Self {
        // Truncated ciphertext and tag mismatch are deliberately the same
        // signal: both mean the frame cannot be trusted.
        ExchangeError::AuthenticationFailed
    }
}
