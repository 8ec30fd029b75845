// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Envelope Codec
//!
//! Typed, versioned framing for protocol messages. Wire layout, big-endian,
//! no padding:
//!
//! `version:1 | requestIdLen:1 | requestId | typeLen:4 (u32) | type | payload`
//!
//! The payload length is implicit (remainder of the buffer); a decoder must
//! never read past the end.

use thiserror::Error;

use super::PROTOCOL_VERSION;

/// Envelope type for a profile request.
pub const TYPE_REQUEST: &str = "request";
/// Envelope type for a profile card response.
pub const TYPE_CARD: &str = "card";

/// Upper bound on the length-prefixed request id.
pub const MAX_REQUEST_ID_LEN: usize = 255;

/// Envelope codec error types.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Request id longer than 255 bytes")]
    RequestIdTooLong,
    #[error("Buffer shorter than the envelope header")]
    Truncated,
    #[error("Declared length exceeds remaining bytes")]
    LengthOutOfBounds,
    #[error("Type or payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A protocol message, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Protocol version.
    pub version: u8,
    /// Opaque request correlation id, 0-255 bytes.
    pub request_id: Vec<u8>,
    /// Message type, compared against [`TYPE_REQUEST`] / [`TYPE_CARD`].
    pub kind: String,
    /// UTF-8 JSON payload.
    pub payload: String,
}

impl Envelope {
    /// Builds the protocol's request envelope: empty request id, `"{}"` payload.
    pub fn request() -> Self {
        Envelope {
            version: PROTOCOL_VERSION,
            request_id: Vec::new(),
            kind: TYPE_REQUEST.to_string(),
            payload: "{}".to_string(),
        }
    }

    /// Builds a card envelope carrying the given profile JSON.
    pub fn card(json: String) -> Self {
        Envelope {
            version: PROTOCOL_VERSION,
            request_id: Vec::new(),
            kind: TYPE_CARD.to_string(),
            payload: json,
        }
    }

    /// Serializes the envelope to its wire format.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.request_id.len() > MAX_REQUEST_ID_LEN {
            return Err(EnvelopeError::RequestIdTooLong);
        }

        let kind = self.kind.as_bytes();
        let payload = self.payload.as_bytes();

        let mut out = Vec::with_capacity(2 + self.request_id.len() + 4 + kind.len() + payload.len());
        out.push(self.version);
        out.push(self.request_id.len() as u8);
        out.extend_from_slice(&self.request_id);
        out.extend_from_slice(&(kind.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);

        Ok(out)
    }

    /// Parses an envelope from its wire format, inverse of [`Envelope::encode`]
    /// on well-formed input.
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        if data.len() < 2 {
            return Err(EnvelopeError::Truncated);
        }

        let version = data[0];
        let rid_len = data[1] as usize;

        let rid_end = 2 + rid_len;
        if data.len() < rid_end + 4 {
            return Err(EnvelopeError::Truncated);
        }
        let request_id = data[2..rid_end].to_vec();

        let type_len = u32::from_be_bytes(
            data[rid_end..rid_end + 4]
                .try_into()
                .map_err(|_| EnvelopeError::Truncated)?,
        ) as usize;

        let type_start = rid_end + 4;
        let type_end = type_start
            .checked_add(type_len)
            .ok_or(EnvelopeError::LengthOutOfBounds)?;
        if data.len() < type_end {
            return Err(EnvelopeError::LengthOutOfBounds);
        }

        let kind = std::str::from_utf8(&data[type_start..type_end])
            .map_err(|_| EnvelopeError::InvalidUtf8)?
            .to_string();
        let payload = std::str::from_utf8(&data[type_end..])
            .map_err(|_| EnvelopeError::InvalidUtf8)?
            .to_string();

        Ok(Envelope {
            version,
            request_id,
            kind,
            payload,
        })
    }
}
