// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Abuse Rate Limiter
//!
//! Guards the responder with two independent gates: a global cap on serves
//! per rolling window and a per-peer cooldown. Denials are never visible on
//! the wire; the responder drops the exchange exactly as it would a
//! malformed payload.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::PeerId;

/// Tunable limits for the responder's rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum grants within one rolling window, across all peers.
    pub global_cap: usize,
    /// Length of the rolling global window.
    pub global_window: Duration,
    /// Minimum time between grants to the same peer.
    pub peer_cooldown: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            global_cap: 5,
            global_window: Duration::from_secs(15 * 60),
            peer_cooldown: Duration::from_secs(120),
        }
    }
}

/// Grant bookkeeping for the responder's activation period.
///
/// The caller supplies the clock; nothing here reads system time, so the
/// gates are fully deterministic under test.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Time-ordered grant timestamps, pruned against the window.
    served: VecDeque<u64>,
    /// Last grant per peer identity.
    last_grant: HashMap<PeerId, u64>,
}

impl RateLimiter {
    /// Creates a limiter with the given limits.
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimiter {
            config,
            served: VecDeque::new(),
            last_grant: HashMap::new(),
        }
    }

    /// Decides whether a serve to `peer` at `now_secs` is allowed, recording
    /// the grant when it is. Both gates must pass.
    pub fn allow(&mut self, peer: &str, now_secs: u64) -> bool {
        let window = self.config.global_window.as_secs();
        while matches!(self.served.front(), Some(&ts) if now_secs.saturating_sub(ts) > window) {
            self.served.pop_front();
        }
        if self.served.len() >= self.config.global_cap {
            return false;
        }

        let cooldown = self.config.peer_cooldown.as_secs();
        if let Some(&last) = self.last_grant.get(peer) {
            if now_secs.saturating_sub(last) < cooldown {
                return false;
            }
        }

        self.served.push_back(now_secs);
        self.last_grant.insert(peer.to_string(), now_secs);
        true
    }

    /// Drops all recorded grants. Called when the responder stops; limiter
    /// state never persists across activations.
    pub fn reset(&mut self) {
        self.served.clear();
        self.last_grant.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
