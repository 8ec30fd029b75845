//! Nearby Core Library
//!
//! Privacy-preserving proximity profile exchange: two nearby devices
//! discover each other through a rotating, unlinkable broadcast identifier
//! and, on explicit request, exchange a small profile payload under an
//! ephemeral encrypted channel. All cryptographic operations use the
//! audited `ring` crate.
//!
//! The transport itself (advertising, scanning, connections, characteristic
//! delivery) is a platform concern; both state machines here are sans-IO
//! and are driven by transport events, returning the commands to run.

pub mod advert;
pub mod crypto;
pub mod exchange;
pub mod profile;

pub use advert::{
    Advertiser, DiscoveredPeer, RotatingId, ADVERT_SERVICE_UUID, IDENTIFIER_LEN, ROTATION_SECONDS,
    RSSI_THRESHOLD, SEED_LEN,
};
pub use crypto::{
    decrypt, encrypt, AgreementError, EncryptionError, EphemeralKeyPair, KDFError, SessionKey,
    SharedSecret, HKDF,
};
pub use exchange::{
    Characteristic, Envelope, EnvelopeError, ExchangeError, Initiator, InitiatorConfig,
    InitiatorEffect, InitiatorEvent, InitiatorState, OpStatus, PeerId, ProfileProvider,
    RateLimitConfig, RateLimiter, ReadOutcome, Responder, ResponderAction, ResponderConfig,
    ResponseStatus, WriteOutcome, PREFERRED_MTU, PROTOCOL_VERSION, SERVICE_UUID,
};
pub use profile::ProfileRecord;
