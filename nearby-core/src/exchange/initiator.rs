// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Initiator State Machine (client role)
//!
//! Drives one outbound handshake and profile fetch to completion or
//! failure. Each transport notification is handled as a pure transition
//! `(state, event) -> (state, effects)`; the effects are commands for the
//! radio stack, so the machine runs unchanged against a fake transport in
//! tests.
//!
//! States advance in strict order with no skipping and no re-entry:
//! `Connecting -> MtuNegotiated -> ServicesDiscovered -> PubKeySent ->
//! SessionKeyDerived -> RequestSent -> Complete`. Every failure path lands
//! in `Aborted`, which tears the connection down. One machine handles
//! exactly one connection; a new fetch attempt means a new machine with
//! fresh ephemeral keys.

use std::time::Duration;

use tracing::{debug, warn};

use super::envelope::{Envelope, TYPE_CARD};
use super::transport::{Characteristic, OpStatus, PREFERRED_MTU};
use super::ExchangeError;
use crate::crypto::{decrypt, encrypt, EphemeralKeyPair, SessionKey, HKDF, MIN_SEALED_SIZE};
use crate::profile::ProfileRecord;

/// Idle watchdog armed at connection start.
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for one fetch attempt.
#[derive(Debug, Clone, Copy)]
pub struct InitiatorConfig {
    /// Transfer unit requested before any payload exchange.
    pub mtu: u16,
    /// Watchdog duration; firing aborts the attempt.
    pub idle_timeout: Duration,
}

impl Default for InitiatorConfig {
    fn default() -> Self {
        InitiatorConfig {
            mtu: PREFERRED_MTU,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}

/// Handshake progress. Terminal states ignore all further events.
#[derive(Debug)]
pub enum InitiatorState {
    /// Waiting for the connection and transfer-unit negotiation.
    Connecting,
    /// Transfer unit agreed, service discovery in flight.
    MtuNegotiated,
    /// Exchange service found, own public key write in flight.
    ServicesDiscovered,
    /// Own public key acknowledged, peer public key read in flight.
    PubKeySent,
    /// Session key derived, encrypted request write in flight.
    SessionKeyDerived,
    /// Request acknowledged, encrypted card read in flight.
    RequestSent,
    /// Terminal: the profile record was delivered.
    Complete,
    /// Terminal: the attempt failed and the connection was torn down.
    Aborted(ExchangeError),
}

/// Transport notifications fed into the machine.
#[derive(Debug)]
pub enum InitiatorEvent {
    /// The connection to the peer was established.
    Connected,
    /// Transfer-unit negotiation finished.
    MtuChanged,
    /// Service discovery finished.
    ServicesDiscovered {
        /// Whether the exchange service was present.
        service_found: bool,
    },
    /// A characteristic write was acknowledged.
    WriteCompleted {
        characteristic: Characteristic,
        status: OpStatus,
    },
    /// A characteristic read returned.
    ReadCompleted {
        characteristic: Characteristic,
        status: OpStatus,
        value: Vec<u8>,
    },
    /// The idle watchdog fired.
    TimeoutFired,
    /// The connection dropped.
    Disconnected,
}

/// Commands for the radio stack, emitted by a transition.
#[derive(Debug, PartialEq)]
pub enum InitiatorEffect {
    /// Request a larger transfer unit.
    NegotiateMtu(u16),
    /// Discover the exchange service.
    DiscoverServices,
    /// Write a characteristic value.
    Write {
        characteristic: Characteristic,
        value: Vec<u8>,
    },
    /// Read a characteristic value.
    Read { characteristic: Characteristic },
    /// Arm the idle watchdog.
    ArmTimeout(Duration),
    /// Disarm the idle watchdog.
    CancelTimeout,
    /// Hand the decoded record to the caller. Emitted at most once.
    DeliverRecord(ProfileRecord),
    /// Tear the connection down, swallowing secondary errors.
    Disconnect,
}

/// One outbound fetch attempt.
pub struct Initiator {
    config: InitiatorConfig,
    state: InitiatorState,
    keys: Option<EphemeralKeyPair>,
    session_key: Option<SessionKey>,
}

impl Initiator {
    /// Creates a machine with fresh ephemeral keys.
    pub fn new() -> Self {
        Self::with_config(InitiatorConfig::default())
    }

    /// Creates a machine with custom tunables.
    pub fn with_config(config: InitiatorConfig) -> Self {
        Initiator {
            config,
            state: InitiatorState::Connecting,
            keys: Some(EphemeralKeyPair::generate()),
            session_key: None,
        }
    }

    /// Effects to run when the caller starts connecting: arms the idle
    /// watchdog. The caller then feeds transport events into
    /// [`Initiator::handle`].
    pub fn start(&mut self) -> Vec<InitiatorEffect> {
        vec![InitiatorEffect::ArmTimeout(self.config.idle_timeout)]
    }

    /// Returns the current state.
    pub fn state(&self) -> &InitiatorState {
        &self.state
    }

    /// Whether the machine reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            InitiatorState::Complete | InitiatorState::Aborted(_)
        )
    }

    /// The failure that aborted the attempt, if any.
    pub fn abort_reason(&self) -> Option<&ExchangeError> {
        match &self.state {
            InitiatorState::Aborted(err) => Some(err),
            _ => None,
        }
    }

    /// Processes one transport event and returns the effects to run.
    ///
    /// Events arriving after a terminal state (stale completions from a
    /// torn-down connection) are ignored.
    pub fn handle(&mut self, event: InitiatorEvent) -> Vec<InitiatorEffect> {
        if self.is_terminal() {
            debug!(?event, "ignoring event after terminal state");
            return Vec::new();
        }

        match event {
            InitiatorEvent::TimeoutFired => {
                warn!("idle watchdog fired, aborting fetch");
                self.state = InitiatorState::Aborted(ExchangeError::Timeout);
                vec![InitiatorEffect::Disconnect]
            }

            InitiatorEvent::Disconnected => {
                warn!("connection dropped mid-handshake");
                self.state = InitiatorState::Aborted(ExchangeError::TransportFailure);
                vec![InitiatorEffect::CancelTimeout]
            }

            InitiatorEvent::Connected => match self.state {
                InitiatorState::Connecting => {
                    vec![InitiatorEffect::NegotiateMtu(self.config.mtu)]
                }
                _ => self.abort(ExchangeError::TransportFailure),
            },

            InitiatorEvent::MtuChanged => match self.state {
                InitiatorState::Connecting => {
                    self.state = InitiatorState::MtuNegotiated;
                    vec![InitiatorEffect::DiscoverServices]
                }
                _ => self.abort(ExchangeError::TransportFailure),
            },

            InitiatorEvent::ServicesDiscovered { service_found } => match self.state {
                InitiatorState::MtuNegotiated if service_found => {
                    let Some(keys) = self.keys.as_ref() else {
                        return self.abort(ExchangeError::TransportFailure);
                    };
                    let value = keys.public_bytes().to_vec();
                    self.state = InitiatorState::ServicesDiscovered;
                    vec![InitiatorEffect::Write {
                        characteristic: Characteristic::KeyExchange,
                        value,
                    }]
                }
                _ => self.abort(ExchangeError::TransportFailure),
            },

            InitiatorEvent::WriteCompleted {
                characteristic,
                status,
            } => {
                if status != OpStatus::Success {
                    return self.abort(ExchangeError::TransportFailure);
                }
                match (&self.state, characteristic) {
                    (InitiatorState::ServicesDiscovered, Characteristic::KeyExchange) => {
                        self.state = InitiatorState::PubKeySent;
                        vec![InitiatorEffect::Read {
                            characteristic: Characteristic::KeyExchange,
                        }]
                    }
                    (InitiatorState::SessionKeyDerived, Characteristic::Exchange) => {
                        self.state = InitiatorState::RequestSent;
                        vec![InitiatorEffect::Read {
                            characteristic: Characteristic::Exchange,
                        }]
                    }
                    _ => self.abort(ExchangeError::TransportFailure),
                }
            }

            InitiatorEvent::ReadCompleted {
                characteristic,
                status,
                value,
            } => {
                if status != OpStatus::Success {
                    return self.abort(ExchangeError::TransportFailure);
                }
                match (&self.state, characteristic) {
                    (InitiatorState::PubKeySent, Characteristic::KeyExchange) => {
                        match self.send_request(&value) {
                            Ok(effects) => effects,
                            Err(err) => self.abort(err),
                        }
                    }
                    (InitiatorState::RequestSent, Characteristic::Exchange) => {
                        if value.len() < MIN_SEALED_SIZE {
                            // The responder publishes nothing when it drops a
                            // request (invalid payload and throttling look the
                            // same). Keep waiting; the watchdog decides.
                            debug!("exchange read returned no card, waiting");
                            return Vec::new();
                        }
                        match self.accept_card(&value) {
                            Ok(effects) => effects,
                            Err(err) => self.abort(err),
                        }
                    }
                    _ => self.abort(ExchangeError::TransportFailure),
                }
            }
        }
    }

    /// Derives the session key from the peer's public key and issues the
    /// encrypted request write.
    fn send_request(&mut self, peer_public: &[u8]) -> Result<Vec<InitiatorEffect>, ExchangeError> {
        let Some(keys) = self.keys.take() else {
            return Err(ExchangeError::TransportFailure);
        };

        let shared = keys.agree(peer_public)?;
        let session_key = HKDF::derive_session_key(&shared);

        let request = Envelope::request().encode()?;
        let frame = encrypt(&session_key, &request);
        self.session_key = Some(session_key);

        debug!("session key derived, sending encrypted request");
        self.state = InitiatorState::SessionKeyDerived;
        Ok(vec![InitiatorEffect::Write {
            characteristic: Characteristic::Exchange,
            value: frame,
        }])
    }

    /// Decrypts and decodes the card response, completing the fetch.
    fn accept_card(&mut self, frame: &[u8]) -> Result<Vec<InitiatorEffect>, ExchangeError> {
        let Some(session_key) = self.session_key.as_ref() else {
            return Err(ExchangeError::TransportFailure);
        };

        let plaintext = decrypt(session_key, frame)?;
        let envelope = Envelope::decode(&plaintext)?;
        if envelope.kind != TYPE_CARD {
            return Err(ExchangeError::UnexpectedEnvelope(envelope.kind));
        }

        let record = ProfileRecord::from_json(&envelope.payload)
            .map_err(|_| ExchangeError::MalformedEnvelope)?;

        debug!("card received, fetch complete");
        self.state = InitiatorState::Complete;
        Ok(vec![
            InitiatorEffect::CancelTimeout,
            InitiatorEffect::DeliverRecord(record),
            InitiatorEffect::Disconnect,
        ])
    }

    fn abort(&mut self, reason: ExchangeError) -> Vec<InitiatorEffect> {
        warn!(%reason, "aborting fetch");
        self.state = InitiatorState::Aborted(reason);
        vec![InitiatorEffect::CancelTimeout, InitiatorEffect::Disconnect]
    }
}

impl Default for Initiator {
    fn default() -> Self {
        Self::new()
    }
}
