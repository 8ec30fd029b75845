// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Responder State Machine (server role)
//!
//! Serves any number of concurrent inbound handshakes. Per peer, only two
//! secrets ever exist: the ephemeral private key awaiting agreement and
//! the derived session key; both are purged the moment that peer
//! disconnects. All per-peer state and the rate limiter sit behind one
//! coarse lock; contention is a handful of short critical sections per
//! handshake.
//!
//! Failure handling is deliberately silent: a missing session key, a
//! malformed or unauthentic payload, and a rate-limit denial all leave the
//! exchange characteristic untouched, so a prober cannot distinguish
//! throttling from garbage input. Do not add error responses here.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::envelope::Envelope;
use super::ratelimit::{RateLimitConfig, RateLimiter};
use super::transport::{Characteristic, PeerId, ResponseStatus};
use super::PROTOCOL_VERSION;
use crate::crypto::{decrypt, encrypt, EphemeralKeyPair, SessionKey, HKDF, MIN_SEALED_SIZE};
use crate::profile::ProfileRecord;

/// Grace period between publishing a card and dropping the connection,
/// long enough for the peer's pending read to complete.
const DISCONNECT_GRACE: Duration = Duration::from_millis(200);

/// Supplies the local profile record, called once per granted request.
pub trait ProfileProvider: Send {
    fn current_profile(&self) -> ProfileRecord;
}

impl<F> ProfileProvider for F
where
    F: Fn() -> ProfileRecord + Send,
{
    fn current_profile(&self) -> ProfileRecord {
        self()
    }
}

/// Tunables for the responder.
#[derive(Debug, Clone, Copy)]
pub struct ResponderConfig {
    /// Delay before the post-serve disconnect.
    pub grace_period: Duration,
    /// Abuse limits.
    pub limits: RateLimitConfig,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        ResponderConfig {
            grace_period: DISCONNECT_GRACE,
            limits: RateLimitConfig::default(),
        }
    }
}

/// Follow-up work the platform must schedule after a write was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderAction {
    /// Drop the peer's connection after the grace period.
    ScheduleDisconnect { peer: PeerId, after: Duration },
}

/// Reply to an inbound read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    pub status: ResponseStatus,
    pub value: Vec<u8>,
}

impl ReadOutcome {
    fn success(value: Vec<u8>) -> Self {
        ReadOutcome {
            status: ResponseStatus::Success,
            value,
        }
    }
}

/// Reply to an inbound write request, plus any deferred actions.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    pub status: ResponseStatus,
    pub actions: Vec<ResponderAction>,
}

impl WriteOutcome {
    fn status_only(status: ResponseStatus) -> Self {
        WriteOutcome {
            status,
            actions: Vec::new(),
        }
    }
}

/// Transient state for one connected peer, destroyed on disconnect.
#[derive(Default)]
struct PeerContext {
    /// Key pair pre-generated by a read of the key-exchange characteristic,
    /// replaced wholesale when the peer's own key arrives.
    pending_keys: Option<EphemeralKeyPair>,
    /// Public key currently exposed on the key-exchange characteristic.
    published_key: Option<Vec<u8>>,
    /// Session key, present once key agreement completed.
    session_key: Option<SessionKey>,
    /// Sealed card published on the exchange characteristic, empty until a
    /// request was granted.
    exchange_value: Vec<u8>,
}

struct Shared {
    peers: HashMap<PeerId, PeerContext>,
    limiter: RateLimiter,
}

/// The server side of the proximity exchange.
pub struct Responder<P: ProfileProvider> {
    config: ResponderConfig,
    provider: P,
    shared: Mutex<Shared>,
}

impl<P: ProfileProvider> Responder<P> {
    /// Creates a responder with default tunables.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ResponderConfig::default())
    }

    /// Creates a responder with custom tunables.
    pub fn with_config(provider: P, config: ResponderConfig) -> Self {
        Responder {
            provider,
            shared: Mutex::new(Shared {
                peers: HashMap::new(),
                limiter: RateLimiter::new(config.limits),
            }),
            config,
        }
    }

    /// Answers an inbound characteristic read request.
    pub fn handle_read(&self, peer: &str, characteristic: Uuid) -> ReadOutcome {
        match Characteristic::from_uuid(characteristic) {
            Some(Characteristic::Capabilities) => ReadOutcome::success(vec![PROTOCOL_VERSION]),

            Some(Characteristic::KeyExchange) => {
                let mut shared = self.shared.lock();
                let ctx = shared.peers.entry(peer.to_string()).or_default();
                if ctx.published_key.is_none() {
                    let keys = EphemeralKeyPair::generate();
                    ctx.published_key = Some(keys.public_bytes().to_vec());
                    ctx.pending_keys = Some(keys);
                    debug!(peer, "published ephemeral key on read");
                }
                ReadOutcome::success(ctx.published_key.clone().unwrap_or_default())
            }

            Some(Characteristic::Exchange) => {
                let shared = self.shared.lock();
                let value = shared
                    .peers
                    .get(peer)
                    .map(|ctx| ctx.exchange_value.clone())
                    .unwrap_or_default();
                ReadOutcome::success(value)
            }

            Some(Characteristic::Status) => ReadOutcome::success(Vec::new()),

            None => ReadOutcome {
                status: ResponseStatus::NotPermitted,
                value: Vec::new(),
            },
        }
    }

    /// Answers an inbound characteristic write request.
    ///
    /// `now_secs` is the responder's clock, used only by the rate limiter.
    pub fn handle_write(
        &self,
        peer: &str,
        characteristic: Uuid,
        value: &[u8],
        now_secs: u64,
    ) -> WriteOutcome {
        match Characteristic::from_uuid(characteristic) {
            Some(Characteristic::KeyExchange) => self.accept_peer_key(peer, value),

            Some(Characteristic::Exchange) => {
                // Prompt acknowledgment, independent of payload validity.
                WriteOutcome {
                    status: ResponseStatus::Success,
                    actions: self.process_request(peer, value, now_secs),
                }
            }

            // Capabilities and status are read-only.
            Some(_) | None => WriteOutcome::status_only(ResponseStatus::NotSupported),
        }
    }

    /// Purges the peer's context. Must be called on every disconnect,
    /// whatever the cause.
    pub fn handle_disconnect(&self, peer: &str) {
        let mut shared = self.shared.lock();
        if shared.peers.remove(peer).is_some() {
            debug!(peer, "purged connection context");
        }
    }

    /// Drops all per-peer state and rate-limiter bookkeeping. Called when
    /// the responder's activation period ends; nothing survives a restart.
    pub fn stop(&self) {
        let mut shared = self.shared.lock();
        shared.peers.clear();
        shared.limiter.reset();
    }

    /// Number of peers with live connection contexts.
    pub fn connected_peers(&self) -> usize {
        self.shared.lock().peers.len()
    }

    /// The peer's public key arrived: validate it, publish a fresh key of
    /// our own, and derive the session key. A bad key fails the write and
    /// leaves the peer's context unchanged.
    fn accept_peer_key(&self, peer: &str, value: &[u8]) -> WriteOutcome {
        let keys = EphemeralKeyPair::generate();
        let public = keys.public_bytes().to_vec();

        let shared_secret = match keys.agree(value) {
            Ok(secret) => secret,
            Err(err) => {
                warn!(peer, %err, "rejected peer public key");
                return WriteOutcome::status_only(ResponseStatus::Failure);
            }
        };
        let session_key = HKDF::derive_session_key(&shared_secret);

        let mut shared = self.shared.lock();
        let ctx = shared.peers.entry(peer.to_string()).or_default();
        if ctx.pending_keys.take().is_some() {
            debug!(peer, "discarding key pair pre-generated on read");
        }
        ctx.published_key = Some(public);
        ctx.session_key = Some(session_key);

        debug!(peer, "session key established");
        WriteOutcome::status_only(ResponseStatus::Success)
    }

    /// An encrypted request arrived on the exchange characteristic.
    ///
    /// Every rejection path drops silently: no session key, short frame,
    /// failed authentication, and rate-limit denial are indistinguishable
    /// to the peer, whose subsequent read just finds nothing published.
    fn process_request(&self, peer: &str, frame: &[u8], now_secs: u64) -> Vec<ResponderAction> {
        let session_key: SessionKey;
        {
            let mut shared = self.shared.lock();
            let Some(key) = shared.peers.get(peer).and_then(|c| c.session_key.clone()) else {
                debug!(peer, "dropping request: no session key");
                return Vec::new();
            };

            if frame.len() < MIN_SEALED_SIZE {
                debug!(peer, "dropping request: malformed frame");
                return Vec::new();
            }
            if decrypt(&key, frame).is_err() {
                debug!(peer, "dropping request: authentication failed");
                return Vec::new();
            }
            if !shared.limiter.allow(peer, now_secs) {
                debug!(peer, "dropping request: rate limited");
                return Vec::new();
            }
            session_key = key;
        }

        // Provider and serialization run outside the lock; only the final
        // publish re-enters it.
        let record = self.provider.current_profile();
        let json = match record.to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!(peer, %err, "profile record failed to serialize");
                return Vec::new();
            }
        };
        let encoded = match Envelope::card(json).encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(peer, %err, "card envelope failed to encode");
                return Vec::new();
            }
        };
        let sealed = encrypt(&session_key, &encoded);

        let mut shared = self.shared.lock();
        let Some(ctx) = shared.peers.get_mut(peer) else {
            // Peer disconnected while the card was being prepared.
            return Vec::new();
        };
        ctx.exchange_value = sealed;

        debug!(peer, "card published for read");
        vec![ResponderAction::ScheduleDisconnect {
            peer: peer.to_string(),
            after: self.config.grace_period,
        }]
    }
}
