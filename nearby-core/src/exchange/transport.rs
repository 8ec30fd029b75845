// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Vocabulary
//!
//! Shared types between the state machines and the platform radio stack.
//! The stack itself (advertising, scanning, connections, characteristic
//! delivery) lives outside this crate; both state machines are sans-IO and
//! talk to it through the events and effects defined alongside them.

use uuid::{uuid, Uuid};

/// Primary GATT service exposed by the responder.
pub const SERVICE_UUID: Uuid = uuid!("0000beef-0000-1000-8000-00805f9b34fb");

/// Transfer unit requested before any payload exchange, large enough that
/// public keys and sealed envelopes fit in a single characteristic value.
pub const PREFERRED_MTU: u16 = 185;

/// A peer's transport address. Opaque to the protocol; the responder keys
/// its per-connection contexts by it.
pub type PeerId = String;

/// The four characteristics of the exchange service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// Read-only, single byte: protocol version.
    Capabilities,
    /// Read+write: raw public key exchange.
    KeyExchange,
    /// Read+write: `nonce || ciphertext` envelope exchange.
    Exchange,
    /// Read-only, reserved, currently always empty.
    Status,
}

impl Characteristic {
    /// Fixed 128-bit identifier of this characteristic.
    pub const fn uuid(self) -> Uuid {
        match self {
            Characteristic::Capabilities => uuid!("0000be01-0000-1000-8000-00805f9b34fb"),
            Characteristic::KeyExchange => uuid!("0000be02-0000-1000-8000-00805f9b34fb"),
            Characteristic::Exchange => uuid!("0000be03-0000-1000-8000-00805f9b34fb"),
            Characteristic::Status => uuid!("0000be04-0000-1000-8000-00805f9b34fb"),
        }
    }

    /// Maps a raw identifier back to a known characteristic.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        [
            Characteristic::Capabilities,
            Characteristic::KeyExchange,
            Characteristic::Exchange,
            Characteristic::Status,
        ]
        .into_iter()
        .find(|c| c.uuid() == uuid)
    }
}

/// Completion status of a characteristic operation, as reported by the
/// radio stack to the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Success,
    Failure,
}

/// Status the responder returns for an inbound read/write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Failure,
    /// Read of a characteristic the service does not expose.
    NotPermitted,
    /// Write of a characteristic the service does not accept writes for.
    NotSupported,
}
