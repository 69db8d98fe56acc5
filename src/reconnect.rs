//! Reconnection policy.
//!
//! Deliberately simple and stateless beyond the timestamps it is handed:
//! no exponential backoff, no retry cap, no circuit breaker.  The driver
//! owns its own per-attempt timeout.
//!
//! Two entry points:
//!
//! - [`ReconnectionPolicy::on_link_lost`]: immediate retry straight from a
//!   disconnect event.
//! - [`ReconnectionPolicy::maybe_retry`]: application-driven periodic retry
//!   ("disconnected for more than 30 s → try again").
//!
//! The event-triggered retry has no cooldown, so against a network that is
//! persistently unreachable it re-issues association once per disconnect
//! event the driver delivers.

use log::{info, warn};

use crate::app::ports::WifiDriver;
use crate::credentials::NetworkCredentials;
use crate::error::DriverError;

/// What [`ReconnectionPolicy::on_link_lost`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Association request issued.
    Issued,
    /// No client credentials stored.
    NoCredentials,
    /// Event-triggered retry switched off in config.
    Disabled,
    /// The driver refused the request.
    Rejected(DriverError),
}

impl RetryDecision {
    pub fn issued(self) -> bool {
        matches!(self, Self::Issued)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReconnectionPolicy {
    retry_on_link_loss: bool,
}

impl ReconnectionPolicy {
    pub const fn new(retry_on_link_loss: bool) -> Self {
        Self { retry_on_link_loss }
    }

    /// Immediate retry hook for a lost link.
    pub fn on_link_lost(
        &self,
        driver: &mut impl WifiDriver,
        credentials: Option<&NetworkCredentials>,
    ) -> RetryDecision {
        if !self.retry_on_link_loss {
            return RetryDecision::Disabled;
        }
        issue(driver, credentials)
    }

    /// `true` once the link has been down for at least `backoff_ms`.
    pub const fn retry_due(now_ms: u64, last_disconnect_ms: u64, backoff_ms: u64) -> bool {
        now_ms.saturating_sub(last_disconnect_ms) >= backoff_ms
    }

    /// Issue a retry if `backoff_ms` has elapsed since `last_disconnect_ms`.
    /// Returns whether a request was actually issued.
    pub fn maybe_retry(
        &self,
        driver: &mut impl WifiDriver,
        credentials: Option<&NetworkCredentials>,
        now_ms: u64,
        last_disconnect_ms: u64,
        backoff_ms: u64,
    ) -> bool {
        if !Self::retry_due(now_ms, last_disconnect_ms, backoff_ms) {
            return false;
        }
        issue(driver, credentials).issued()
    }
}

fn issue(driver: &mut impl WifiDriver, credentials: Option<&NetworkCredentials>) -> RetryDecision {
    let Some(creds) = credentials else {
        return RetryDecision::NoCredentials;
    };
    info!("[WiFi] retrying association with '{}'", creds.ssid());
    match driver.begin_association(creds.ssid(), creds.passphrase()) {
        Ok(()) => RetryDecision::Issued,
        Err(e) => {
            warn!("[WiFi] retry rejected: {}", e);
            RetryDecision::Rejected(e)
        }
    }
}
