//! Supervisor configuration parameters
//!
//! Timing and default-identity knobs for the WiFi supervisor.  Values can be
//! overridden by a JSON blob (e.g. baked into the image at build time);
//! credentials themselves are never part of this struct.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Core supervisor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    // --- Association ---
    /// Default bound for the blocking association wait in `begin` (ms)
    pub connect_timeout_ms: u32,
    /// Driver status poll interval while waiting for association (ms)
    pub status_poll_interval_ms: u32,
    /// Pause between tear-down and re-association in `reconnect` (ms)
    pub reconnect_settle_ms: u32,

    // --- Reconnection ---
    /// Re-issue association straight from the disconnect event
    pub retry_on_link_loss: bool,
    /// Application-driven retry interval used by `maybe_retry` (ms)
    pub retry_backoff_ms: u32,

    // --- Access point defaults ---
    /// AP SSID used when the application never configures one
    pub default_ap_ssid: heapless::String<32>,
    /// AP secret used when the application never configures one
    pub default_ap_passphrase: heapless::String<64>,

    // --- Identity ---
    /// Hostname prefix, completed with the chip suffix
    pub hostname_prefix: heapless::String<24>,
}

fn fixed<const N: usize>(value: &str) -> heapless::String<N> {
    let mut s = heapless::String::new();
    let _ = s.push_str(&value[..value.len().min(N)]);
    s
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            // Association
            connect_timeout_ms: 10_000,
            status_poll_interval_ms: 250,
            reconnect_settle_ms: 100,

            // Reconnection
            retry_on_link_loss: true,
            retry_backoff_ms: 30_000,

            // Access point
            default_ap_ssid: fixed("ESP_WiFi_AP"),
            default_ap_passphrase: fixed("password123"),

            // Identity
            hostname_prefix: fixed("ESP_Device_"),
        }
    }
}

impl SupervisorConfig {
    /// Parse a JSON override; missing fields keep their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_slice(bytes)
            .map_err(|_| ConfigurationError::InvalidConfig("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.status_poll_interval_ms == 0 {
            return Err(ConfigurationError::InvalidConfig("status_poll_interval_ms must be > 0"));
        }
        if self.status_poll_interval_ms > self.connect_timeout_ms {
            return Err(ConfigurationError::InvalidConfig(
                "status_poll_interval_ms exceeds connect_timeout_ms",
            ));
        }
        if self.default_ap_ssid.is_empty() {
            return Err(ConfigurationError::InvalidConfig("default_ap_ssid is empty"));
        }
        Ok(())
    }
}
