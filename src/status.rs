//! Status register: the single edge-triggered record of link state.
//!
//! Both the driver event path and the polling fallback funnel through
//! [`StatusRegister::record`].  A transition is stored only when the
//! observed state differs from the stored one, so repeated observations of
//! an unchanged link never move the timestamp and never produce a second
//! notification.
//!
//! ```text
//!  driver event ──▶ EventCorrelator ──┐
//!                                     ├──▶ StatusRegister::record ──▶ Transition?
//!  poll (status) ──▶ Supervisor ──────┘
//! ```
//!
//! The compare-and-store runs inside a critical section, so an event
//! delivered on the system event task cannot interleave with a poll from
//! the application loop and lose an update.

use core::cell::Cell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::{Deserialize, Serialize};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

/// Client link state as reported by the driver.
///
/// Discriminants match the numeric status codes the ESP WiFi stack has
/// always reported, so diagnostics stay comparable across firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConnectionState {
    Idle = 0,
    NoNetworkFound = 1,
    ScanCompleted = 2,
    Connected = 3,
    ConnectFailed = 4,
    ConnectionLost = 5,
    Disconnected = 6,
    Unknown = 255,
}

impl ConnectionState {
    pub const ALL: [Self; 8] = [
        Self::Idle,
        Self::NoNetworkFound,
        Self::ScanCompleted,
        Self::Connected,
        Self::ConnectFailed,
        Self::ConnectionLost,
        Self::Disconnected,
        Self::Unknown,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Map a raw status code back to a state.  Unrecognised codes are `Unknown`.
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Idle,
            1 => Self::NoNetworkFound,
            2 => Self::ScanCompleted,
            3 => Self::Connected,
            4 => Self::ConnectFailed,
            5 => Self::ConnectionLost,
            6 => Self::Disconnected,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label used in logs and status dumps.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::NoNetworkFound => "Network not found",
            Self::ScanCompleted => "Scan completed",
            Self::Connected => "Connected",
            Self::ConnectFailed => "Connection failed",
            Self::ConnectionLost => "Connection lost",
            Self::Disconnected => "Disconnected",
            Self::Unknown => "Unknown",
        }
    }

    /// Link is down after having been requested (lost or torn down).
    pub const fn is_link_down(self) -> bool {
        matches!(self, Self::ConnectionLost | Self::Disconnected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ───────────────────────────────────────────────────────────────
// Records
// ───────────────────────────────────────────────────────────────

/// Read-only snapshot of the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub state: ConnectionState,
    pub label: &'static str,
    /// Monotonic milliseconds of the last *change* (not the last poll).
    pub changed_at_ms: u64,
}

impl StatusRecord {
    /// Milliseconds the current state has been held at `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.changed_at_ms)
    }
}

/// One recorded edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    state: ConnectionState,
    changed_at_ms: u64,
}

// ───────────────────────────────────────────────────────────────
// StatusRegister
// ───────────────────────────────────────────────────────────────

/// Last-known connection state plus the time it last changed.
pub struct StatusRegister {
    slot: Mutex<CriticalSectionRawMutex, Cell<Slot>>,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    /// A fresh register holds `Disconnected`, changed at t = 0.
    pub const fn new() -> Self {
        Self::with_state(ConnectionState::Disconnected, 0)
    }

    pub const fn with_state(state: ConnectionState, changed_at_ms: u64) -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                state,
                changed_at_ms,
            })),
        }
    }

    /// Store `observed` if it differs from the current state.
    ///
    /// Returns the recorded edge, or `None` when the observation was a
    /// repeat of the stored state (timestamp untouched).
    pub fn record(&self, observed: ConnectionState, now_ms: u64) -> Option<Transition> {
        self.record_with(|_| observed, now_ms)
    }

    /// Derive the next state from the stored one and record it, all in one
    /// critical section.
    ///
    /// `next` runs with the lock held and must not touch the register.
    pub fn record_with<F>(&self, next: F, now_ms: u64) -> Option<Transition>
    where
        F: FnOnce(ConnectionState) -> ConnectionState,
    {
        self.slot.lock(|cell| {
            let current = cell.get();
            let observed = next(current.state);
            if current.state == observed {
                return None;
            }
            cell.set(Slot {
                state: observed,
                changed_at_ms: now_ms,
            });
            Some(Transition {
                from: current.state,
                to: observed,
                at_ms: now_ms,
            })
        })
    }

    /// `true` only if `observed` differed from the stored state.
    pub fn record_transition(&self, observed: ConnectionState, now_ms: u64) -> bool {
        self.record(observed, now_ms).is_some()
    }

    /// Pure accessor.  Never blocks beyond the critical section, never mutates.
    pub fn read(&self) -> StatusRecord {
        let slot = self.slot.lock(Cell::get);
        StatusRecord {
            state: slot.state,
            label: slot.state.label(),
            changed_at_ms: slot.changed_at_ms,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.slot.lock(Cell::get).state
    }
}

impl fmt::Debug for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusRegister").field("record", &self.read()).finish()
    }
}
