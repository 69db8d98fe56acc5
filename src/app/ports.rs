//! Port traits: the hexagonal boundary between the supervisor and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConnectionSupervisor (domain)
//! ```
//!
//! The platform WiFi driver, its event loop, the clock and the diagnostics
//! output are all driven adapters.  The
//! [`ConnectionSupervisor`](super::supervisor::ConnectionSupervisor)
//! consumes them via generics, so the domain core never touches the radio
//! directly and runs on the host against fakes.

use core::fmt;
use core::net::Ipv4Addr;

use serde::Serialize;

use crate::credentials::Ssid;
use crate::error::DriverError;
use crate::identity::{Hostname, MacAddress};
use crate::status::ConnectionState;

use super::events::{DriverEvent, DriverEventKind, SupervisorEvent};

// ───────────────────────────────────────────────────────────────
// Operating mode
// ───────────────────────────────────────────────────────────────

/// Radio operating mode, derived once at `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatingMode {
    ClientOnly,
    AccessPointOnly,
    ClientPlusAccessPoint,
}

impl OperatingMode {
    /// AP not requested → client; AP requested → AP, plus client if configured.
    pub const fn derive(access_point_requested: bool, client_configured: bool) -> Self {
        match (access_point_requested, client_configured) {
            (false, _) => Self::ClientOnly,
            (true, false) => Self::AccessPointOnly,
            (true, true) => Self::ClientPlusAccessPoint,
        }
    }

    pub const fn has_client(self) -> bool {
        !matches!(self, Self::AccessPointOnly)
    }

    pub const fn has_access_point(self) -> bool {
        !matches!(self, Self::ClientOnly)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ClientOnly => "Client",
            Self::AccessPointOnly => "Access point",
            Self::ClientPlusAccessPoint => "Client + Access point",
        })
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi driver port (driven adapter: domain ↔ radio)
// ───────────────────────────────────────────────────────────────

/// What the supervisor needs from the platform network driver.
///
/// Queries are non-blocking reads of driver state; `None` means the value
/// is not currently available (no lease, AP not running, ...).
pub trait WifiDriver {
    /// Start (or restart) the radio in `mode`.
    fn set_mode(&mut self, mode: OperatingMode) -> Result<(), DriverError>;

    /// Bring up the soft-AP.  `passphrase = None` starts an open AP.
    fn start_access_point(
        &mut self,
        ssid: &str,
        passphrase: Option<&str>,
    ) -> Result<(), DriverError>;

    /// Request association.  Returns once the request is queued; the outcome
    /// arrives through events and [`status`](Self::status).
    fn begin_association(&mut self, ssid: &str, passphrase: &str) -> Result<(), DriverError>;

    /// Tear down the client association.  Leaves the soft-AP alone.
    fn disconnect(&mut self) -> Result<(), DriverError>;

    /// Current client link state.
    fn status(&self) -> ConnectionState;

    fn set_hostname(&mut self, hostname: &str) -> Result<(), DriverError>;
    fn hostname(&self) -> Option<Hostname>;

    fn local_ip(&self) -> Option<Ipv4Addr>;
    fn access_point_ip(&self) -> Option<Ipv4Addr>;
    fn gateway_ip(&self) -> Option<Ipv4Addr>;
    fn dns_ip(&self) -> Option<Ipv4Addr>;
    /// SSID of the network the station is associated with.
    fn ssid(&self) -> Option<Ssid>;
    /// Signal strength of the associated AP in dBm.
    fn rssi(&self) -> Option<i8>;
    /// Factory station MAC.
    fn mac_address(&self) -> MacAddress;
    /// Peers currently joined to the soft-AP.
    fn station_count(&self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Event source port (driven adapter: radio → domain)
// ───────────────────────────────────────────────────────────────

/// Callback invoked on the platform's event context.
pub type EventHandler = Box<dyn FnMut(DriverEvent) + Send + 'static>;

/// Platform event subscription, one implementation per platform.
///
/// Handlers may run on a different execution context from the application
/// loop (the ESP-IDF system event task), hence `Send`.
pub trait EventSource {
    fn subscribe(
        &mut self,
        kind: DriverEventKind,
        handler: EventHandler,
    ) -> Result<(), DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus a blocking delay.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// Diagnostics output.  Never consulted for control decisions.
pub trait EventSink {
    fn emit(&mut self, event: &SupervisorEvent);
}

/// Sink that drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &SupervisorEvent) {}
}
