//! Network identity: hostname resolution and MAC formatting.
//!
//! The hostname is either set explicitly or derived from a prefix plus a
//! hardware-unique suffix.  The suffix is the upper 16 bits of the 48-bit
//! factory MAC, read the way the eFuse word is laid out (little-endian
//! `u64`, shifted right by 32), printed in decimal.  It is deterministic
//! across reboots.
//!
//! Re-applying a hostname after the station already holds a DHCP lease is
//! platform dependent: ESP-IDF only announces the new name on the next
//! lease, so the interface may need a restart before peers see it.

use core::fmt::Write;

use crate::error::ConfigurationError;

pub const HOSTNAME_MAX_LEN: usize = 32;
/// Leaves room for the widest decimal suffix inside [`HOSTNAME_MAX_LEN`].
pub const HOSTNAME_PREFIX_MAX_LEN: usize = 24;

pub type Hostname = heapless::String<HOSTNAME_MAX_LEN>;
pub type HostnamePrefix = heapless::String<HOSTNAME_PREFIX_MAX_LEN>;
pub type MacAddress = [u8; 6];
pub type MacString = heapless::String<17>;

pub fn hostname(name: &str) -> Result<Hostname, ConfigurationError> {
    if name.is_empty() {
        return Err(ConfigurationError::InvalidHostname);
    }
    Hostname::try_from(name).map_err(|()| ConfigurationError::InvalidHostname)
}

pub fn hostname_prefix(prefix: &str) -> Result<HostnamePrefix, ConfigurationError> {
    HostnamePrefix::try_from(prefix).map_err(|()| ConfigurationError::InvalidHostname)
}

/// Hardware suffix derived from the factory MAC.
pub fn chip_suffix(mac: &MacAddress) -> u32 {
    u32::from(u16::from_le_bytes([mac[4], mac[5]]))
}

/// `explicit` wins; otherwise `prefix` + decimal chip suffix.
pub fn resolve_hostname(explicit: Option<&Hostname>, prefix: &str, mac: &MacAddress) -> Hostname {
    if let Some(name) = explicit {
        return name.clone();
    }
    let mut name = Hostname::new();
    // Prefix capacity guarantees the suffix fits.
    let _ = write!(name, "{}{}", prefix, chip_suffix(mac));
    name
}

/// `AA:BB:CC:DD:EE:FF`, uppercase.
pub fn format_mac(mac: &MacAddress) -> MacString {
    let mut s = MacString::new();
    let _ = write!(
        s,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    s
}
