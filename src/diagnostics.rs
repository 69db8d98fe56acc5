//! Status dump.
//!
//! [`StatusReport`] is the snapshot behind `print_status`: the current
//! status record always, plus client and soft-AP sections when a detailed
//! dump is asked for.  It logs as a block of `info!` lines and serialises
//! to JSON for anything that wants it off-device.

use core::net::Ipv4Addr;

use log::info;
use serde::{Serialize, Serializer};

use crate::app::ports::OperatingMode;
use crate::credentials::Ssid;
use crate::identity::{Hostname, MacString};
use crate::status::ConnectionState;

/// Station-side details, present only while connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientReport {
    #[serde(serialize_with = "opt_ip")]
    pub ip: Option<Ipv4Addr>,
    #[serde(serialize_with = "opt_ip")]
    pub gateway: Option<Ipv4Addr>,
    #[serde(serialize_with = "opt_ip")]
    pub dns: Option<Ipv4Addr>,
    pub mac: MacString,
    pub hostname: Hostname,
    pub rssi: Option<i8>,
    pub ssid: Option<Ssid>,
}

/// Soft-AP details, present only when the AP was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPointReport {
    pub ssid: Ssid,
    #[serde(serialize_with = "opt_ip")]
    pub ip: Option<Ipv4Addr>,
    pub stations: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub code: u8,
    pub state: ConnectionState,
    pub label: &'static str,
    /// Whole seconds since the last recorded transition.
    pub since_change_secs: u64,
    pub initialized: bool,
    pub mode: Option<OperatingMode>,
    pub client: Option<ClientReport>,
    pub access_point: Option<AccessPointReport>,
}

impl StatusReport {
    /// Write the dump to the log, one field per line.
    pub fn log(&self) {
        info!("=== WiFi status ===");
        info!("status: {} ({})", self.label, self.code);
        if let Some(mode) = self.mode {
            info!("mode: {}", mode);
        }
        if let Some(client) = &self.client {
            info!("IP: {}", or_unset(client.ip));
            info!("gateway: {}", or_unset(client.gateway));
            info!("DNS: {}", or_unset(client.dns));
            info!("MAC: {}", client.mac);
            info!("hostname: {}", client.hostname);
            if let Some(rssi) = client.rssi {
                info!("RSSI: {} dBm", rssi);
            }
            if let Some(ssid) = &client.ssid {
                info!("SSID: {}", ssid);
            }
        }
        if let Some(ap) = &self.access_point {
            info!("AP SSID: {}", ap.ssid);
            info!("AP IP: {}", or_unset(ap.ip));
            info!("AP stations: {}", ap.stations);
        }
        info!("last change: {} s ago", self.since_change_secs);
        info!("initialised: {}", if self.initialized { "yes" } else { "no" });
        info!("===================");
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn or_unset(ip: Option<Ipv4Addr>) -> Ipv4Addr {
    ip.unwrap_or(Ipv4Addr::UNSPECIFIED)
}

fn opt_ip<S: Serializer>(ip: &Option<Ipv4Addr>, s: S) -> Result<S::Ok, S::Error> {
    match ip {
        Some(ip) => s.collect_str(ip),
        None => s.serialize_none(),
    }
}
