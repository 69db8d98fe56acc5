//! Inbound driver events and outbound supervisor events.
//!
//! [`DriverEvent`]s arrive from the platform's network event loop through
//! the [`EventSource`](super::ports::EventSource) port.  The supervisor
//! emits [`SupervisorEvent`]s through the
//! [`EventSink`](super::ports::EventSink) port; adapters decide where they
//! go (serial log, telemetry, a test recorder).

use core::fmt;
use core::net::Ipv4Addr;

use crate::identity::MacAddress;
use crate::status::ConnectionState;

use super::ports::OperatingMode;

// ───────────────────────────────────────────────────────────────
// Disconnect reason
// ───────────────────────────────────────────────────────────────

/// 802.11 / ESP-IDF `wifi_err_reason_t` code attached to a station
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectReason(pub u16);

impl DisconnectReason {
    pub const UNSPECIFIED: Self = Self(1);
    pub const AUTH_EXPIRE: Self = Self(2);
    /// The station itself asked to leave (local `disconnect()`).
    pub const ASSOC_LEAVE: Self = Self(8);
    pub const HANDSHAKE_TIMEOUT: Self = Self(15);
    pub const BEACON_TIMEOUT: Self = Self(200);
    pub const NO_AP_FOUND: Self = Self(201);
    pub const AUTH_FAIL: Self = Self(202);
    pub const ASSOC_FAIL: Self = Self(203);
    pub const CONNECTION_FAIL: Self = Self(205);

    /// Leave requested locally rather than a loss of link.
    pub const fn is_local_leave(self) -> bool {
        self.0 == Self::ASSOC_LEAVE.0
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            1 => "unspecified",
            2 => "auth expired",
            8 => "assoc leave",
            15 => "4-way handshake timeout",
            200 => "beacon timeout",
            201 => "no AP found",
            202 => "auth failed",
            203 => "assoc failed",
            204 => "handshake timeout",
            205 => "connection failed",
            _ => "other",
        };
        write!(f, "{} ({})", self.0, name)
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// Event kinds a platform adapter can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverEventKind {
    AddressAcquired,
    StationDisconnected,
    AccessPointStationJoined,
    AccessPointStationLeft,
}

impl DriverEventKind {
    pub const ALL: [Self; 4] = [
        Self::AddressAcquired,
        Self::StationDisconnected,
        Self::AccessPointStationJoined,
        Self::AccessPointStationLeft,
    ];
}

/// Asynchronous notification from the platform network driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// DHCP lease obtained on the station interface.
    AddressAcquired { ip: Ipv4Addr },
    /// Station lost (or left) its association.
    StationDisconnected { reason: DisconnectReason },
    /// A peer joined our soft-AP.
    AccessPointStationJoined { mac: MacAddress },
    /// A peer left our soft-AP.
    AccessPointStationLeft { mac: MacAddress },
}

impl DriverEvent {
    pub const fn kind(&self) -> DriverEventKind {
        match self {
            Self::AddressAcquired { .. } => DriverEventKind::AddressAcquired,
            Self::StationDisconnected { .. } => DriverEventKind::StationDisconnected,
            Self::AccessPointStationJoined { .. } => DriverEventKind::AccessPointStationJoined,
            Self::AccessPointStationLeft { .. } => DriverEventKind::AccessPointStationLeft,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

/// Structured events emitted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// The status register recorded an edge.
    StatusChanged {
        from: ConnectionState,
        to: ConnectionState,
        at_ms: u64,
    },
    /// Station interface got an address.
    AddressAcquired(Ipv4Addr),
    /// Station lost its association.
    LinkLost(DisconnectReason),
    /// A fresh association request was issued.
    AssociationRequested { ssid: heapless::String<32> },
    /// The soft-AP came up.
    AccessPointStarted {
        ssid: heapless::String<32>,
        open: bool,
    },
    /// A peer joined the soft-AP.
    StationJoined(MacAddress),
    /// A peer left the soft-AP.
    StationLeft(MacAddress),
    /// `begin` finished (carries the derived mode).
    Initialized(OperatingMode),
}
