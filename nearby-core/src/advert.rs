// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rotating Broadcast Identifier
//!
//! A time-sliced, keyed-hash-derived tag broadcast in place of a stable
//! address. Deterministic within one slot, unlinkable across slots for
//! observers without the seed. Linkability through the radio-layer address
//! itself is an external concern.

use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use uuid::{uuid, Uuid};
use zeroize::Zeroize;

/// Service identifier carrying the rotating tag in advertisement data.
pub const ADVERT_SERVICE_UUID: Uuid = uuid!("0000feed-0000-1000-8000-00805f9b34fb");

/// Seconds between identifier rotations (and advertisement restarts).
pub const ROTATION_SECONDS: u64 = 180;

/// Length of the broadcast identifier in bytes.
pub const IDENTIFIER_LEN: usize = 8;

/// Length of the advertising seed in bytes.
pub const SEED_LEN: usize = 16;

/// Signal strength floor below which a discovered peer is not shown.
pub const RSSI_THRESHOLD: i16 = -120;

/// Keyed generator for the rotating identifier.
///
/// The seed lives for one advertising session and is zeroized on drop;
/// identifiers are recomputed per slot, never stored.
pub struct RotatingId {
    seed: [u8; SEED_LEN],
}

impl Drop for RotatingId {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl RotatingId {
    /// Creates a generator with a fresh random seed.
    pub fn new() -> Self {
        let rng = SystemRandom::new();
        let mut seed = [0u8; SEED_LEN];
        rng.fill(&mut seed).expect("System RNG should not fail");
        RotatingId { seed }
    }

    /// Creates a generator from a fixed seed (for testing).
    pub fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        RotatingId { seed }
    }

    /// Computes the identifier for the slot containing `epoch_secs`:
    /// the first 8 bytes of HMAC-SHA256(seed, big_endian64(slot)).
    pub fn current(&self, epoch_secs: u64, slot_secs: u64) -> [u8; IDENTIFIER_LEN] {
        let slot = epoch_secs / slot_secs;
        let key = hmac::Key::new(hmac::HMAC_SHA256, &self.seed);
        let digest = hmac::sign(&key, &slot.to_be_bytes());

        let mut id = [0u8; IDENTIFIER_LEN];
        id.copy_from_slice(&digest.as_ref()[..IDENTIFIER_LEN]);
        id
    }
}

impl Default for RotatingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RotatingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingId")
            .field("seed", &"[REDACTED]")
            .finish()
    }
}

/// Drives identifier rotation for one advertising session.
///
/// The platform owns the timer and the radio; this type only decides when
/// the published payload must change. [`Advertiser::refresh`] returns a new
/// identifier exactly when the time slot rolled over, at which point the
/// caller stops and restarts the advertisement with the new service data.
#[derive(Debug)]
pub struct Advertiser {
    rotating: RotatingId,
    slot_secs: u64,
    published_slot: Option<u64>,
}

impl Advertiser {
    /// Creates an advertiser with a fresh seed and the standard rotation period.
    pub fn new() -> Self {
        Self::with_period(ROTATION_SECONDS)
    }

    /// Creates an advertiser with a custom rotation period (for testing).
    pub fn with_period(slot_secs: u64) -> Self {
        Advertiser {
            rotating: RotatingId::new(),
            slot_secs,
            published_slot: None,
        }
    }

    /// Returns the identifier for the current slot without touching
    /// rotation state.
    pub fn current_identifier(&self, now_secs: u64) -> [u8; IDENTIFIER_LEN] {
        self.rotating.current(now_secs, self.slot_secs)
    }

    /// Returns the service data to publish if the slot changed since the
    /// last call, `None` while the published identifier is still current.
    pub fn refresh(&mut self, now_secs: u64) -> Option<[u8; IDENTIFIER_LEN]> {
        let slot = now_secs / self.slot_secs;
        if self.published_slot == Some(slot) {
            return None;
        }
        self.published_slot = Some(slot);

        let id = self.rotating.current(now_secs, self.slot_secs);
        tracing::debug!(identifier = %hex::encode(id), "rotating advertised identifier");
        Some(id)
    }
}

impl Default for Advertiser {
    fn default() -> Self {
        Self::new()
    }
}

/// A peer seen during a scan, as handed to the peer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPeer {
    /// Transport address of the peer.
    pub peer: String,
    /// Signal strength in dBm.
    pub rssi: i16,
    /// Rotating identifier from the advertisement service data.
    pub identifier: [u8; IDENTIFIER_LEN],
}

impl DiscoveredPeer {
    /// Builds a peer record from raw advertisement service data.
    ///
    /// Returns `None` when the service data is too short to carry an
    /// identifier.
    pub fn from_service_data(peer: &str, rssi: i16, data: &[u8]) -> Option<Self> {
        if data.len() < IDENTIFIER_LEN {
            return None;
        }
        let mut identifier = [0u8; IDENTIFIER_LEN];
        identifier.copy_from_slice(&data[..IDENTIFIER_LEN]);

        Some(DiscoveredPeer {
            peer: peer.to_string(),
            rssi,
            identifier,
        })
    }

    /// Whether the peer is close enough to display.
    pub fn is_in_range(&self) -> bool {
        self.rssi >= RSSI_THRESHOLD
    }
}
