//! Error taxonomy for the WiFi supervisor.
//!
//! Nothing in the supervisor panics or aborts.  Every decision point that
//! used to be a silent no-op resolves to one of these values instead, so the
//! caller can inspect the outcome without scraping status text.  All
//! variants are `Copy` so they can cross the event-context boundary without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level supervisor error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorError {
    /// Missing or invalid credentials / identity.  The call was a no-op.
    Configuration(ConfigurationError),
    /// Association did not complete within the bound.  Status stays
    /// non-Connected and is observable through `read()`.
    Timeout { waited_ms: u64 },
    /// The platform driver refused a request (radio busy, not started, ...).
    DriverRejection(DriverError),
    /// `begin` was called a second time; driver and status were left alone.
    AlreadyInitialized,
    /// An operation that needs a started driver ran before `begin`.
    NotInitialized,
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "configuration: {e}"),
            Self::Timeout { waited_ms } => write!(f, "association timed out after {waited_ms} ms"),
            Self::DriverRejection(e) => write!(f, "driver: {e}"),
            Self::AlreadyInitialized => write!(f, "WiFi already initialised"),
            Self::NotInitialized => write!(f, "WiFi not initialised"),
        }
    }
}

impl core::error::Error for SupervisorError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// SSID is empty.
    EmptySsid,
    /// SSID longer than 32 bytes.
    SsidTooLong,
    /// Secret is not empty and not 8..=64 bytes.
    InvalidPassphrase,
    /// Association requested but no client network is configured.
    MissingClientCredentials,
    /// Hostname or hostname prefix is empty or too long.
    InvalidHostname,
    /// Config blob could not be parsed or failed range checks.
    InvalidConfig(&'static str),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySsid => write!(f, "SSID is empty"),
            Self::SsidTooLong => write!(f, "SSID longer than 32 bytes"),
            Self::InvalidPassphrase => {
                write!(f, "passphrase must be empty (open) or 8-64 bytes")
            }
            Self::MissingClientCredentials => write!(f, "no client network configured"),
            Self::InvalidHostname => write!(f, "hostname must be 1-32 bytes"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl From<ConfigurationError> for SupervisorError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

/// A request the platform driver refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The driver has not been started (no mode selected yet).
    NotStarted,
    /// The radio is busy with another operation (scan, mode change).
    Busy,
    /// The driver rejected the supplied configuration.
    InvalidConfiguration,
    /// Event subscription could not be registered.
    SubscriptionFailed,
    /// Any other platform error, tagged with the failing call.
    Platform(&'static str),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "driver not started"),
            Self::Busy => write!(f, "radio busy"),
            Self::InvalidConfiguration => write!(f, "configuration rejected"),
            Self::SubscriptionFailed => write!(f, "event subscription failed"),
            Self::Platform(call) => write!(f, "platform call failed: {call}"),
        }
    }
}

impl From<DriverError> for SupervisorError {
    fn from(e: DriverError) -> Self {
        Self::DriverRejection(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, SupervisorError>;
