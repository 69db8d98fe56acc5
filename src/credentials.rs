//! Client and access-point credentials.
//!
//! Held in fixed-capacity strings so the supervisor never allocates for
//! them.  Nothing here is persisted; credentials live for the life of the
//! supervisor.
//!
//! ## Access-point security policy
//!
//! The radio driver refuses WPA2 secrets shorter than 8 characters.  Rather
//! than failing AP start-up, a too-short AP secret is **downgraded to an
//! open access point**.  The downgrade is logged at `warn` level and reported
//! in [`AccessPointPlan::downgraded`] so the caller can see it happened.

use core::fmt;

use log::warn;

use crate::error::ConfigurationError;

pub const SSID_MAX_LEN: usize = 32;
pub const PASSPHRASE_MIN_LEN: usize = 8;
pub const PASSPHRASE_MAX_LEN: usize = 64;

pub type Ssid = heapless::String<SSID_MAX_LEN>;
pub type Passphrase = heapless::String<PASSPHRASE_MAX_LEN>;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn to_ssid(ssid: &str) -> Result<Ssid, ConfigurationError> {
    if ssid.is_empty() {
        return Err(ConfigurationError::EmptySsid);
    }
    Ssid::try_from(ssid).map_err(|()| ConfigurationError::SsidTooLong)
}

fn to_passphrase(passphrase: &str) -> Result<Passphrase, ConfigurationError> {
    Passphrase::try_from(passphrase).map_err(|()| ConfigurationError::InvalidPassphrase)
}

// ───────────────────────────────────────────────────────────────
// Client network
// ───────────────────────────────────────────────────────────────

/// Infrastructure network the station associates with.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkCredentials {
    ssid: Ssid,
    passphrase: Passphrase,
}

impl NetworkCredentials {
    /// An empty passphrase means an open network; otherwise 8..=64 bytes.
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, ConfigurationError> {
        let ssid = to_ssid(ssid)?;
        if !passphrase.is_empty() && passphrase.len() < PASSPHRASE_MIN_LEN {
            return Err(ConfigurationError::InvalidPassphrase);
        }
        Ok(Self {
            ssid,
            passphrase: to_passphrase(passphrase)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }
}

// Keep secrets out of logs.
impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &self.ssid)
            .field("open", &self.is_open())
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────
// Access point
// ───────────────────────────────────────────────────────────────

/// Identity of the soft-AP.  The secret is stored as given; the length
/// policy is applied when the AP is started (see [`Self::plan`]).
#[derive(Clone, PartialEq, Eq)]
pub struct AccessPointCredentials {
    ssid: Ssid,
    passphrase: Passphrase,
}

/// What the driver is actually asked to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointPlan {
    pub ssid: Ssid,
    /// `None` starts an open AP.
    pub passphrase: Option<Passphrase>,
    /// A non-empty secret shorter than 8 characters was dropped.
    pub downgraded: bool,
}

impl AccessPointPlan {
    pub fn is_open(&self) -> bool {
        self.passphrase.is_none()
    }
}

impl AccessPointCredentials {
    /// Short secrets are accepted here and downgraded at start-up.
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            ssid: to_ssid(ssid)?,
            passphrase: to_passphrase(passphrase)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Apply the secret-length policy.
    pub fn plan(&self) -> AccessPointPlan {
        let len = self.passphrase.len();
        if len >= PASSPHRASE_MIN_LEN {
            return AccessPointPlan {
                ssid: self.ssid.clone(),
                passphrase: Some(self.passphrase.clone()),
                downgraded: false,
            };
        }
        let downgraded = len > 0;
        if downgraded {
            warn!(
                "AP: secret for '{}' is {} chars (< {}), starting OPEN access point",
                self.ssid, len, PASSPHRASE_MIN_LEN
            );
        }
        AccessPointPlan {
            ssid: self.ssid.clone(),
            passphrase: None,
            downgraded,
        }
    }
}

/// `ESP_WiFi_AP` / `password123`.
impl Default for AccessPointCredentials {
    fn default() -> Self {
        let mut ssid = Ssid::new();
        let _ = ssid.push_str("ESP_WiFi_AP");
        let mut passphrase = Passphrase::new();
        let _ = passphrase.push_str("password123");
        Self { ssid, passphrase }
    }
}

impl fmt::Debug for AccessPointCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPointCredentials")
            .field("ssid", &self.ssid)
            .field("secret_len", &self.passphrase.len())
            .finish()
    }
}
