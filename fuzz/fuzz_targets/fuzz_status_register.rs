//! Fuzz target: `StatusRegister` + `EventCorrelator`
//!
//! Treats the input as a stream of (opcode, payload) byte pairs that mix
//! raw status observations with driver events, and verifies:
//! - No panics under arbitrary byte inputs
//! - Every recorded edge starts at the previously stored state
//! - No edge ever records the state it started from
//!
//! cargo fuzz run fuzz_status_register

#![no_main]

use std::net::Ipv4Addr;
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use wifi_supervisor::app::events::{DisconnectReason, DriverEvent};
use wifi_supervisor::correlator::EventCorrelator;
use wifi_supervisor::status::{ConnectionState, StatusRegister};

fuzz_target!(|data: &[u8]| {
    let reg = Arc::new(StatusRegister::new());
    let correlator = EventCorrelator::new(Arc::clone(&reg));
    let mut now = 0u64;

    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        now += u64::from(op >> 3);
        let before = reg.state();

        let edge = match op % 4 {
            0 => reg.record(ConnectionState::from_code(arg), now),
            1 => {
                let ip = Ipv4Addr::new(10, 0, 0, arg);
                correlator
                    .correlate(DriverEvent::AddressAcquired { ip }, now)
                    .transition
            }
            2 => {
                let reason = DisconnectReason(u16::from(arg));
                correlator
                    .correlate(DriverEvent::StationDisconnected { reason }, now)
                    .transition
            }
            _ => correlator
                .correlate(DriverEvent::AccessPointStationJoined { mac: [arg; 6] }, now)
                .transition,
        };

        if let Some(t) = edge {
            assert_eq!(t.from, before, "edge must start at the stored state");
            assert_ne!(t.from, t.to, "edge must change state");
            assert_eq!(reg.read().changed_at_ms, now);
        } else {
            assert_eq!(reg.state(), before, "state moved without an edge");
        }
    }
});
