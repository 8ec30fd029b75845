// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Profile Record
//!
//! The small payload exchanged between peers: social-media aliases plus
//! optional tags and expiry. JSON layout on the wire:
//! `{"v": 1, "aliases": {"ig": "@achraf"}, "tags": [], "exp": 1700000000}`.
//!
//! Alias keys are opaque to the protocol; unknown platforms round-trip
//! unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_version() -> u32 {
    1
}

/// A profile record supplied by the local user or decoded from a peer's card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Record format version.
    #[serde(rename = "v", default = "default_version")]
    pub version: u32,
    /// Platform key to handle, e.g. `"ig" -> "@achraf"`.
    pub aliases: BTreeMap<String, String>,
    /// Free-form tags, order preserved.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional expiry as epoch seconds.
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl ProfileRecord {
    /// Creates a record with the given aliases.
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        ProfileRecord {
            version: default_version(),
            aliases,
            tags: Vec::new(),
            expires_at: None,
        }
    }

    /// Adds tags to the record.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets an expiry time.
    pub fn with_expiry(mut self, epoch_secs: u64) -> Self {
        self.expires_at = Some(epoch_secs);
        self
    }

    /// Serializes the record to its wire JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a record from wire JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the record has expired at `now_secs`. Records without an
    /// expiry never expire.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        matches!(self.expires_at, Some(exp) if now_secs > exp)
    }
}
