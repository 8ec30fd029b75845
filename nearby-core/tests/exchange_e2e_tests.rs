// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-End Exchange Tests
//!
//! Runs the initiator and responder against each other through a small
//! in-memory transport pump: initiator effects become responder requests,
//! responder outcomes become initiator events. No radio stack involved.

use std::collections::BTreeMap;
use std::time::Duration;

use nearby_core::exchange::{
    Characteristic, Initiator, InitiatorEffect, InitiatorEvent, InitiatorState, OpStatus,
    ProfileProvider, Responder, ResponderAction, ResponseStatus,
};
use nearby_core::{ExchangeError, ProfileRecord};

fn achraf_record() -> ProfileRecord {
    let mut aliases = BTreeMap::new();
    aliases.insert("instagram".to_string(), "achraf".to_string());
    ProfileRecord::new(aliases)
}

/// What the pump observed while draining one fetch attempt.
#[derive(Default)]
struct PumpResult {
    delivered: Option<ProfileRecord>,
    watchdog_armed: bool,
    responder_disconnects: Vec<(String, Duration)>,
}

/// Drives one initiator run against the responder until no effects remain.
///
/// `mangle_write` can tamper with outbound exchange frames, simulating
/// corruption between the two radios. The pump delivers each completion
/// exactly once and in order, as the transport contract requires.
fn pump<P: ProfileProvider>(
    initiator: &mut Initiator,
    responder: &Responder<P>,
    peer: &str,
    now_secs: u64,
    mangle_write: impl Fn(Characteristic, Vec<u8>) -> Vec<u8>,
) -> PumpResult {
    let mut result = PumpResult::default();
    let mut queue = initiator.start();
    queue.extend(initiator.handle(InitiatorEvent::Connected));

    while !queue.is_empty() {
        let mut next = Vec::new();
        for effect in queue {
            match effect {
                InitiatorEffect::NegotiateMtu(_) => {
                    next.extend(initiator.handle(InitiatorEvent::MtuChanged));
                }
                InitiatorEffect::DiscoverServices => {
                    next.extend(initiator.handle(InitiatorEvent::ServicesDiscovered {
                        service_found: true,
                    }));
                }
                InitiatorEffect::Write {
                    characteristic,
                    value,
                } => {
                    let value = mangle_write(characteristic, value);
                    let outcome =
                        responder.handle_write(peer, characteristic.uuid(), &value, now_secs);
                    for action in outcome.actions {
                        let ResponderAction::ScheduleDisconnect { peer, after } = action;
                        result.responder_disconnects.push((peer, after));
                    }
                    let status = if outcome.status == ResponseStatus::Success {
                        OpStatus::Success
                    } else {
                        OpStatus::Failure
                    };
                    next.extend(initiator.handle(InitiatorEvent::WriteCompleted {
                        characteristic,
                        status,
                    }));
                }
                InitiatorEffect::Read { characteristic } => {
                    let outcome = responder.handle_read(peer, characteristic.uuid());
                    let status = if outcome.status == ResponseStatus::Success {
                        OpStatus::Success
                    } else {
                        OpStatus::Failure
                    };
                    next.extend(initiator.handle(InitiatorEvent::ReadCompleted {
                        characteristic,
                        status,
                        value: outcome.value,
                    }));
                }
                InitiatorEffect::ArmTimeout(_) => result.watchdog_armed = true,
                InitiatorEffect::CancelTimeout => result.watchdog_armed = false,
                InitiatorEffect::DeliverRecord(record) => {
                    assert!(result.delivered.is_none(), "at most one delivery per run");
                    result.delivered = Some(record);
                }
                InitiatorEffect::Disconnect => {
                    responder.handle_disconnect(peer);
                    next.extend(initiator.handle(InitiatorEvent::Disconnected));
                }
            }
        }
        queue = next;
    }

    result
}

fn no_mangling(_: Characteristic, value: Vec<u8>) -> Vec<u8> {
    value
}

#[test]
fn test_scenario_a_full_exchange_delivers_exact_record() {
    let responder = Responder::new(|| achraf_record());
    let mut initiator = Initiator::new();

    let result = pump(&mut initiator, &responder, "AA:BB:CC:DD:EE:01", 0, no_mangling);

    let delivered = result.delivered.expect("fetch should succeed");
    assert_eq!(delivered.aliases.len(), 1);
    assert_eq!(
        delivered.aliases.get("instagram").map(String::as_str),
        Some("achraf")
    );
    assert_eq!(delivered, achraf_record());

    assert!(matches!(initiator.state(), InitiatorState::Complete));
    // Watchdog disarmed on the success path.
    assert!(!result.watchdog_armed);
    // The responder scheduled its grace disconnect after serving.
    assert_eq!(
        result.responder_disconnects,
        vec![("AA:BB:CC:DD:EE:01".to_string(), Duration::from_millis(200))]
    );
    // And the teardown purged the peer's context.
    assert_eq!(responder.connected_peers(), 0);
}

#[test]
fn test_scenario_b_corrupted_request_starves_initiator_until_timeout() {
    let responder = Responder::new(|| achraf_record());
    let mut initiator = Initiator::new();

    // Flip the last bit of the encrypted request between the radios.
    let result = pump(
        &mut initiator,
        &responder,
        "AA:BB:CC:DD:EE:02",
        0,
        |characteristic, mut value| {
            if characteristic == Characteristic::Exchange {
                let last = value.len() - 1;
                value[last] ^= 0x01;
            }
            value
        },
    );

    // Nothing was published, nothing delivered, watchdog still pending.
    assert!(result.delivered.is_none());
    assert!(result.responder_disconnects.is_empty());
    assert!(result.watchdog_armed);
    assert!(matches!(initiator.state(), InitiatorState::RequestSent));

    // The 5-second watchdog ends the attempt as an opaque failure.
    let effects = initiator.handle(InitiatorEvent::TimeoutFired);
    assert_eq!(effects, vec![InitiatorEffect::Disconnect]);
    assert_eq!(initiator.abort_reason(), Some(&ExchangeError::Timeout));
}

#[test]
fn test_scenario_c_second_request_within_cooldown_times_out() {
    let responder = Responder::new(|| achraf_record());
    let peer = "AA:BB:CC:DD:EE:03";

    // First fetch at t=0 succeeds.
    let mut first = Initiator::new();
    let result = pump(&mut first, &responder, peer, 0, no_mangling);
    assert!(result.delivered.is_some());

    // Second fetch from the same peer 60 seconds later: the handshake and
    // decryption succeed, but the limiter silently drops the request.
    let mut second = Initiator::new();
    let result = pump(&mut second, &responder, peer, 60, no_mangling);

    assert!(result.delivered.is_none());
    assert!(result.responder_disconnects.is_empty());
    assert!(matches!(second.state(), InitiatorState::RequestSent));

    let _ = second.handle(InitiatorEvent::TimeoutFired);
    assert_eq!(second.abort_reason(), Some(&ExchangeError::Timeout));
}

#[test]
fn test_consecutive_fetches_from_distinct_peers() {
    let responder = Responder::new(|| achraf_record());

    for i in 0..3 {
        let peer = format!("AA:BB:CC:DD:EE:1{i}");
        let mut initiator = Initiator::new();
        let result = pump(&mut initiator, &responder, &peer, 1_000, no_mangling);
        assert!(
            result.delivered.is_some(),
            "distinct peer {peer} within the global cap should be served"
        );
    }
}

#[test]
fn test_tags_and_expiry_survive_the_wire() {
    let record = achraf_record()
        .with_tags(vec!["music".to_string(), "climbing".to_string()])
        .with_expiry(1_900_000_000);
    let served = record.clone();

    let responder = Responder::new(move || served.clone());
    let mut initiator = Initiator::new();

    let result = pump(&mut initiator, &responder, "AA:BB:CC:DD:EE:04", 0, no_mangling);

    assert_eq!(result.delivered, Some(record));
}
