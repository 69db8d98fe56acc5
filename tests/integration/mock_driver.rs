//! Mock radio, clock, sink and event source for integration tests.
//!
//! The radio records every driver call so tests can assert on the full
//! command history.  Its association outcome is scripted against the
//! manual clock, so "timeouts" run instantly.

use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use wifi_supervisor::app::events::{DriverEvent, DriverEventKind, SupervisorEvent};
use wifi_supervisor::app::ports::{
    Clock, EventHandler, EventSink, EventSource, OperatingMode, WifiDriver,
};
use wifi_supervisor::credentials::Ssid;
use wifi_supervisor::error::DriverError;
use wifi_supervisor::identity::{Hostname, MacAddress};
use wifi_supervisor::status::ConnectionState;

pub const MOCK_MAC: MacAddress = [0x24, 0x6F, 0x28, 0xAA, 0xBB, 0xCC];

// ── ManualClock ───────────────────────────────────────────────

/// Virtual monotonic clock; `sleep_ms` advances it instantly.
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── Driver call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    SetMode(OperatingMode),
    StartAccessPoint {
        ssid: String,
        passphrase: Option<String>,
    },
    BeginAssociation { ssid: String },
    Disconnect,
    SetHostname(String),
}

// ── MockRadio ─────────────────────────────────────────────────

pub struct MockRadio {
    pub calls: Vec<DriverCall>,
    /// Association completes this long after the request; `None` = never.
    pub join_latency_ms: Option<u64>,
    /// Overrides the scripted status when set.
    pub forced: Option<ConnectionState>,
    pub reject_association: bool,
    pub stations: u8,
    requested_at: Option<u64>,
    access_point: bool,
    hostname: Option<Hostname>,
}

/// Cloneable handle: the test keeps one, the supervisor owns another.
#[derive(Clone)]
pub struct MockDriver {
    radio: Rc<RefCell<MockRadio>>,
    clock: ManualClock,
}

#[allow(dead_code)]
impl MockDriver {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            radio: Rc::new(RefCell::new(MockRadio {
                calls: Vec::new(),
                join_latency_ms: None,
                forced: None,
                reject_association: false,
                stations: 0,
                requested_at: None,
                access_point: false,
                hostname: None,
            })),
            clock,
        }
    }

    pub fn joining_after(clock: ManualClock, latency_ms: u64) -> Self {
        let d = Self::new(clock);
        d.radio.borrow_mut().join_latency_ms = Some(latency_ms);
        d
    }

    pub fn radio(&self) -> std::cell::RefMut<'_, MockRadio> {
        self.radio.borrow_mut()
    }

    pub fn force(&self, state: ConnectionState) {
        self.radio.borrow_mut().forced = Some(state);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.radio.borrow().calls.clone()
    }

    pub fn association_count(&self) -> usize {
        self.radio
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, DriverCall::BeginAssociation { .. }))
            .count()
    }

    fn is_up(&self) -> bool {
        self.status() == ConnectionState::Connected
    }
}

impl WifiDriver for MockDriver {
    fn set_mode(&mut self, mode: OperatingMode) -> Result<(), DriverError> {
        self.radio.borrow_mut().calls.push(DriverCall::SetMode(mode));
        Ok(())
    }

    fn start_access_point(
        &mut self,
        ssid: &str,
        passphrase: Option<&str>,
    ) -> Result<(), DriverError> {
        let mut r = self.radio.borrow_mut();
        r.calls.push(DriverCall::StartAccessPoint {
            ssid: ssid.to_owned(),
            passphrase: passphrase.map(str::to_owned),
        });
        r.access_point = true;
        Ok(())
    }

    fn begin_association(&mut self, ssid: &str, _passphrase: &str) -> Result<(), DriverError> {
        let now = self.clock.now_ms();
        let mut r = self.radio.borrow_mut();
        r.calls.push(DriverCall::BeginAssociation {
            ssid: ssid.to_owned(),
        });
        if r.reject_association {
            return Err(DriverError::Busy);
        }
        r.requested_at = Some(now);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), DriverError> {
        let mut r = self.radio.borrow_mut();
        r.calls.push(DriverCall::Disconnect);
        r.requested_at = None;
        r.forced = None;
        Ok(())
    }

    fn status(&self) -> ConnectionState {
        let r = self.radio.borrow();
        if let Some(state) = r.forced {
            return state;
        }
        match (r.requested_at, r.join_latency_ms) {
            (Some(at), Some(latency)) if self.clock.now_ms() >= at + latency => {
                ConnectionState::Connected
            }
            _ => ConnectionState::Disconnected,
        }
    }

    fn set_hostname(&mut self, hostname: &str) -> Result<(), DriverError> {
        let mut r = self.radio.borrow_mut();
        r.calls.push(DriverCall::SetHostname(hostname.to_owned()));
        r.hostname = Hostname::try_from(hostname).ok();
        Ok(())
    }

    fn hostname(&self) -> Option<Hostname> {
        self.radio.borrow().hostname.clone()
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.is_up().then_some(Ipv4Addr::new(192, 168, 1, 42))
    }

    fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.radio.borrow().access_point.then_some(Ipv4Addr::new(192, 168, 4, 1))
    }

    fn gateway_ip(&self) -> Option<Ipv4Addr> {
        self.is_up().then_some(Ipv4Addr::new(192, 168, 1, 1))
    }

    fn dns_ip(&self) -> Option<Ipv4Addr> {
        self.gateway_ip()
    }

    fn ssid(&self) -> Option<Ssid> {
        if !self.is_up() {
            return None;
        }
        self.radio.borrow().calls.iter().rev().find_map(|c| match c {
            DriverCall::BeginAssociation { ssid } => Ssid::try_from(ssid.as_str()).ok(),
            _ => None,
        })
    }

    fn rssi(&self) -> Option<i8> {
        self.is_up().then_some(-55)
    }

    fn mac_address(&self) -> MacAddress {
        MOCK_MAC
    }

    fn station_count(&self) -> u8 {
        self.radio.borrow().stations
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SupervisorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded transitions into `state`.
    pub fn transitions_to(&self, state: ConnectionState) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SupervisorEvent::StatusChanged { to, .. } if *to == state))
            .count()
    }

    pub fn association_requests(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SupervisorEvent::AssociationRequested { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SupervisorEvent) {
        self.events.push(event.clone());
    }
}

// ── FakeEventSource ───────────────────────────────────────────

/// Stores handlers and fires them synchronously, standing in for the
/// platform event task.
#[derive(Default)]
pub struct FakeEventSource {
    handlers: Vec<(DriverEventKind, EventHandler)>,
    pub refuse: bool,
}

#[allow(dead_code)]
impl FakeEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribed(&self) -> usize {
        self.handlers.len()
    }

    pub fn fire(&mut self, event: DriverEvent) {
        for (kind, handler) in &mut self.handlers {
            if *kind == event.kind() {
                handler(event);
            }
        }
    }
}

impl EventSource for FakeEventSource {
    fn subscribe(
        &mut self,
        kind: DriverEventKind,
        handler: EventHandler,
    ) -> Result<(), DriverError> {
        if self.refuse {
            return Err(DriverError::SubscriptionFailed);
        }
        self.handlers.push((kind, handler));
        Ok(())
    }
}
