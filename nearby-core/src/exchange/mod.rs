// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proximity Exchange Module
//!
//! The connection-oriented protocol between two nearby devices: an
//! initiator drives a strict sequence of characteristic operations against
//! a responder to obtain one encrypted profile card under an ephemeral,
//! authenticated-by-possession session key.
//!
//! The scheme authenticates possession of the session only, not the peer's
//! identity: it is anonymous ECDH and remains open to an active
//! man-in-the-middle that intercepts both characteristic exchanges. Adding
//! identity authentication would change the wire protocol and is out of
//! scope here.

#[cfg(feature = "testing")]
pub mod envelope;
#[cfg(not(feature = "testing"))]
mod envelope;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod initiator;
#[cfg(not(feature = "testing"))]
mod initiator;

#[cfg(feature = "testing")]
pub mod ratelimit;
#[cfg(not(feature = "testing"))]
mod ratelimit;

#[cfg(feature = "testing")]
pub mod responder;
#[cfg(not(feature = "testing"))]
mod responder;

#[cfg(feature = "testing")]
pub mod transport;
#[cfg(not(feature = "testing"))]
mod transport;

/// Version byte served from the capabilities characteristic and carried in
/// every envelope.
pub const PROTOCOL_VERSION: u8 = 1;

pub use envelope::{Envelope, EnvelopeError, MAX_REQUEST_ID_LEN, TYPE_CARD, TYPE_REQUEST};
pub use error::ExchangeError;
pub use initiator::{
    Initiator, InitiatorConfig, InitiatorEffect, InitiatorEvent, InitiatorState,
};
pub use ratelimit::{RateLimitConfig, RateLimiter};
pub use responder::{
    ProfileProvider, ReadOutcome, Responder, ResponderAction, ResponderConfig, WriteOutcome,
};
pub use transport::{
    Characteristic, OpStatus, PeerId, ResponseStatus, PREFERRED_MTU, SERVICE_UUID,
};
