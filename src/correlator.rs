//! Event correlator: turns driver events into status transitions.
//!
//! Event delivery is the low-latency path; polling is only the backstop.
//! Both go through [`StatusRegister::record`], so an address-acquired event
//! followed by a poll that also sees `Connected` records one edge, not two.
//!
//! | Event                    | Register                          | Follow-up          |
//! |--------------------------|-----------------------------------|--------------------|
//! | address acquired         | `Connected`                       | none               |
//! | station disconnected     | `ConnectionLost` / `Disconnected` | retry request      |
//! | AP station joined / left | untouched                         | observability only |
//!
//! A local leave never asks for a retry.
//!
//! The correlator is `Send + Sync` and cheap to clone, so the platform
//! adapter can run it directly on the driver's event task.  Actions that
//! need the driver (the retry) are carried back to the application loop in
//! the returned [`Correlation`].

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::events::{DisconnectReason, DriverEvent, SupervisorEvent};
use crate::app::ports::{Clock, EventHandler};
use crate::status::{ConnectionState, StatusRegister, Transition};

/// Pending correlations between event context and the application loop.
pub const INBOX_DEPTH: usize = 8;

pub type CorrelationInbox = Channel<CriticalSectionRawMutex, Correlation, INBOX_DEPTH>;

// ───────────────────────────────────────────────────────────────
// Correlation
// ───────────────────────────────────────────────────────────────

/// Outcome of correlating one driver event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    pub event: DriverEvent,
    /// Edge recorded in the register, if any.
    pub transition: Option<Transition>,
    /// The station lost its link; the reconnection policy should be asked.
    pub link_lost: bool,
}

impl Correlation {
    /// Observability events for the sink, in emission order.
    pub fn notices(&self) -> heapless::Vec<SupervisorEvent, 2> {
        let mut out = heapless::Vec::new();
        if let Some(t) = self.transition {
            let _ = out.push(SupervisorEvent::StatusChanged {
                from: t.from,
                to: t.to,
                at_ms: t.at_ms,
            });
        }
        let notice = match self.event {
            DriverEvent::AddressAcquired { ip } => SupervisorEvent::AddressAcquired(ip),
            DriverEvent::StationDisconnected { reason } => SupervisorEvent::LinkLost(reason),
            DriverEvent::AccessPointStationJoined { mac } => SupervisorEvent::StationJoined(mac),
            DriverEvent::AccessPointStationLeft { mac } => SupervisorEvent::StationLeft(mac),
        };
        let _ = out.push(notice);
        out
    }
}

/// State to record for a station disconnect.
///
/// A repeat disconnect while the link is already down keeps the stored
/// state, so a burst of disconnect events records exactly one edge.
pub fn disconnect_state(current: ConnectionState, reason: DisconnectReason) -> ConnectionState {
    if current.is_link_down() {
        current
    } else if reason.is_local_leave() {
        ConnectionState::Disconnected
    } else {
        ConnectionState::ConnectionLost
    }
}

// ───────────────────────────────────────────────────────────────
// EventCorrelator
// ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct EventCorrelator {
    register: Arc<StatusRegister>,
}

impl EventCorrelator {
    pub fn new(register: Arc<StatusRegister>) -> Self {
        Self { register }
    }

    /// Record the event's effect on the register and describe the follow-up.
    pub fn correlate(&self, event: DriverEvent, now_ms: u64) -> Correlation {
        match event {
            DriverEvent::AddressAcquired { ip } => {
                info!("[WiFi] address acquired: {}", ip);
                Correlation {
                    event,
                    transition: self.register.record(ConnectionState::Connected, now_ms),
                    link_lost: false,
                }
            }
            DriverEvent::StationDisconnected { reason } => {
                warn!("[WiFi] disconnected, reason {}", reason);
                let transition = self
                    .register
                    .record_with(|current| disconnect_state(current, reason), now_ms);
                Correlation {
                    event,
                    transition,
                    // Our own disconnect()/reconnect() tear-down is not a loss.
                    link_lost: !reason.is_local_leave(),
                }
            }
            DriverEvent::AccessPointStationJoined { mac } => {
                info!("[AP] station joined: {}", crate::identity::format_mac(&mac));
                Correlation {
                    event,
                    transition: None,
                    link_lost: false,
                }
            }
            DriverEvent::AccessPointStationLeft { mac } => {
                info!("[AP] station left: {}", crate::identity::format_mac(&mac));
                Correlation {
                    event,
                    transition: None,
                    link_lost: false,
                }
            }
        }
    }

    /// Build a platform callback that correlates on the event context and
    /// hands the result to `inbox` for the application loop.
    ///
    /// A full inbox drops the follow-up (the transition is already stored);
    /// the polling path and `maybe_retry` cover the gap.
    pub fn handler<C>(&self, inbox: Arc<CorrelationInbox>, clock: C) -> EventHandler
    where
        C: Clock + Send + 'static,
    {
        let correlator = self.clone();
        Box::new(move |event| {
            let correlation = correlator.correlate(event, clock.now_ms());
            if inbox.try_send(correlation).is_err() {
                warn!("[WiFi] event inbox full, dropping follow-up for {:?}", event.kind());
            }
        })
    }
}
