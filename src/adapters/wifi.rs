//! WiFi driver adapter.
//!
//! Implements [`WifiDriver`], the hexagonal boundary for the radio.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side runs.
//!
//! ## Status synthesis
//!
//! ESP-IDF has no single "status code" query, so [`WifiDriver::status`] is
//! derived from what the driver does expose:
//!
//! | Driver view                                   | Reported            |
//! |-----------------------------------------------|---------------------|
//! | station up with an address                    | `Connected`         |
//! | was up, dropped without a local `disconnect`  | `ConnectionLost`    |
//! | anything else, including a pending request    | `Disconnected`      |
//!
//! A lost link keeps reporting `ConnectionLost` through any number of retry
//! requests until it is up again or the application disconnects, so the
//! poll never flaps against the disconnect events.  The event path refines
//! this with the disconnect reason; both paths end in the same register,
//! which only records edges.

use core::cell::Cell;
use core::net::Ipv4Addr;

use log::info;

use crate::app::ports::{OperatingMode, WifiDriver};
use crate::credentials::{Passphrase, Ssid};
use crate::error::DriverError;
use crate::identity::{Hostname, MacAddress};
use crate::status::ConnectionState;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_factory_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_factory_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

// ───────────────────────────────────────────────────────────────
// Link bookkeeping shared by both builds
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LinkTrack {
    was_up: Cell<bool>,
    lost: Cell<bool>,
}

impl LinkTrack {
    /// Local tear-down: whatever follows is not a loss.
    fn left(&self) {
        self.was_up.set(false);
        self.lost.set(false);
    }

    fn classify(&self, up: bool) -> ConnectionState {
        if up {
            self.was_up.set(true);
            self.lost.set(false);
            return ConnectionState::Connected;
        }
        if self.was_up.replace(false) {
            self.lost.set(true);
        }
        if self.lost.get() {
            ConnectionState::ConnectionLost
        } else {
            ConnectionState::Disconnected
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Driver adapter
// ───────────────────────────────────────────────────────────────

pub struct Esp32WifiDriver {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    mode: Option<OperatingMode>,
    client: Option<(Ssid, Passphrase)>,
    access_point: Option<(Ssid, Option<Passphrase>)>,
    link: LinkTrack,
    /// Simulation: when the pending association completes.
    #[cfg(not(target_os = "espidf"))]
    sim_up_at: Option<std::time::Instant>,
    #[cfg(not(target_os = "espidf"))]
    sim_latency: std::time::Duration,
    #[cfg(not(target_os = "espidf"))]
    sim_hostname: Option<Hostname>,
}

fn to_ssid(s: &str) -> Result<Ssid, DriverError> {
    Ssid::try_from(s).map_err(|()| DriverError::InvalidConfiguration)
}

fn to_passphrase(s: &str) -> Result<Passphrase, DriverError> {
    Passphrase::try_from(s).map_err(|()| DriverError::InvalidConfiguration)
}

impl Esp32WifiDriver {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            wifi,
            mode: None,
            client: None,
            access_point: None,
            link: LinkTrack::default(),
        }
    }

    /// Simulated radio: every association succeeds after `latency`.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(latency: std::time::Duration) -> Self {
        Self {
            mode: None,
            client: None,
            access_point: None,
            link: LinkTrack::default(),
            sim_up_at: None,
            sim_latency: latency,
            sim_hostname: None,
        }
    }

    /// Simulation: drop the link as if the access point went away.
    /// Later association requests complete after `rejoin_after`.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_link_loss(&mut self, rejoin_after: std::time::Duration) {
        self.sim_up_at = None;
        self.sim_latency = rejoin_after;
        info!("WiFi(sim): link lost");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn apply(&mut self) -> Result<(), DriverError> {
        let Some(mode) = self.mode else {
            return Err(DriverError::NotStarted);
        };
        let client = || {
            let mut c = ClientConfiguration::default();
            if let Some((ssid, pass)) = &self.client {
                c.ssid = ssid.clone();
                c.password = pass.clone();
                c.auth_method = if pass.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                };
            }
            c
        };
        let access_point = || {
            let mut c = AccessPointConfiguration::default();
            if let Some((ssid, pass)) = &self.access_point {
                c.ssid = ssid.clone();
                match pass {
                    Some(p) => {
                        c.password = p.clone();
                        c.auth_method = AuthMethod::WPA2Personal;
                    }
                    None => c.auth_method = AuthMethod::None,
                }
            }
            c
        };
        let configuration = match mode {
            OperatingMode::ClientOnly => Configuration::Client(client()),
            OperatingMode::AccessPointOnly => Configuration::AccessPoint(access_point()),
            OperatingMode::ClientPlusAccessPoint => Configuration::Mixed(client(), access_point()),
        };
        self.wifi
            .set_configuration(&configuration)
            .map_err(|_| DriverError::Platform("set_configuration"))?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| DriverError::Platform("start"))?;
            info!("WiFi: driver started ({})", mode);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn apply(&mut self) -> Result<(), DriverError> {
        if self.mode.is_none() {
            return Err(DriverError::NotStarted);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), DriverError> {
        self.wifi.connect().map_err(|_| DriverError::Platform("connect"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), DriverError> {
        self.sim_up_at = Some(std::time::Instant::now() + self.sim_latency);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) -> Result<(), DriverError> {
        self.wifi.disconnect().map_err(|_| DriverError::Platform("disconnect"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) -> Result<(), DriverError> {
        self.sim_up_at = None;
        info!("WiFi(sim): disconnected");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
            && self
                .wifi
                .sta_netif()
                .get_ip_info()
                .is_ok_and(|info| !info.ip.is_unspecified())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_up(&self) -> bool {
        self.sim_up_at.is_some_and(|t| std::time::Instant::now() >= t)
    }
}

impl WifiDriver for Esp32WifiDriver {
    fn set_mode(&mut self, mode: OperatingMode) -> Result<(), DriverError> {
        self.mode = Some(mode);
        self.apply()
    }

    fn start_access_point(
        &mut self,
        ssid: &str,
        passphrase: Option<&str>,
    ) -> Result<(), DriverError> {
        if !self.mode.is_some_and(OperatingMode::has_access_point) {
            return Err(DriverError::NotStarted);
        }
        let passphrase = passphrase.map(to_passphrase).transpose()?;
        self.access_point = Some((to_ssid(ssid)?, passphrase));
        self.apply()
    }

    fn begin_association(&mut self, ssid: &str, passphrase: &str) -> Result<(), DriverError> {
        if !self.mode.is_some_and(OperatingMode::has_client) {
            return Err(DriverError::NotStarted);
        }
        self.client = Some((to_ssid(ssid)?, to_passphrase(passphrase)?));
        self.apply()?;
        self.platform_connect()
    }

    fn disconnect(&mut self) -> Result<(), DriverError> {
        self.link.left();
        self.platform_disconnect()
    }

    fn status(&self) -> ConnectionState {
        self.link.classify(self.platform_is_up())
    }

    #[cfg(target_os = "espidf")]
    fn set_hostname(&mut self, hostname: &str) -> Result<(), DriverError> {
        let netif = self.wifi.sta_netif_mut();
        netif
            .set_hostname(hostname)
            .map_err(|_| DriverError::Platform("set_hostname"))
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_hostname(&mut self, hostname: &str) -> Result<(), DriverError> {
        let hostname =
            Hostname::try_from(hostname).map_err(|()| DriverError::InvalidConfiguration)?;
        self.sim_hostname = Some(hostname);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn hostname(&self) -> Option<Hostname> {
        let name = self.wifi.sta_netif().get_hostname().ok()?;
        Hostname::try_from(name.as_str()).ok()
    }

    #[cfg(not(target_os = "espidf"))]
    fn hostname(&self) -> Option<Hostname> {
        self.sim_hostname.clone()
    }

    #[cfg(target_os = "espidf")]
    fn local_ip(&self) -> Option<Ipv4Addr> {
        let info = self.wifi.sta_netif().get_ip_info().ok()?;
        (!info.ip.is_unspecified()).then_some(info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.platform_is_up().then_some(Ipv4Addr::new(192, 168, 1, 50))
    }

    #[cfg(target_os = "espidf")]
    fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.access_point.as_ref()?;
        let info = self.wifi.ap_netif().get_ip_info().ok()?;
        Some(info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.access_point.as_ref().map(|_| Ipv4Addr::new(192, 168, 4, 1))
    }

    #[cfg(target_os = "espidf")]
    fn gateway_ip(&self) -> Option<Ipv4Addr> {
        self.local_ip()?;
        self.wifi.sta_netif().get_ip_info().ok().map(|info| info.subnet.gateway)
    }

    #[cfg(not(target_os = "espidf"))]
    fn gateway_ip(&self) -> Option<Ipv4Addr> {
        self.local_ip().map(|_| Ipv4Addr::new(192, 168, 1, 1))
    }

    #[cfg(target_os = "espidf")]
    fn dns_ip(&self) -> Option<Ipv4Addr> {
        self.local_ip()?;
        self.wifi.sta_netif().get_ip_info().ok().and_then(|info| info.dns)
    }

    #[cfg(not(target_os = "espidf"))]
    fn dns_ip(&self) -> Option<Ipv4Addr> {
        self.gateway_ip()
    }

    fn ssid(&self) -> Option<Ssid> {
        if !self.platform_is_up() {
            return None;
        }
        self.client.as_ref().map(|(ssid, _)| ssid.clone())
    }

    #[cfg(target_os = "espidf")]
    fn rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::*;
        let mut ap_info: wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let ret = unsafe { esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn rssi(&self) -> Option<i8> {
        self.platform_is_up().then_some(-60)
    }

    #[cfg(target_os = "espidf")]
    fn mac_address(&self) -> MacAddress {
        self.wifi.sta_netif().get_mac().unwrap_or_else(|_| read_factory_mac())
    }

    #[cfg(not(target_os = "espidf"))]
    fn mac_address(&self) -> MacAddress {
        read_factory_mac()
    }

    #[cfg(target_os = "espidf")]
    fn station_count(&self) -> u8 {
        use esp_idf_svc::sys::*;
        if self.access_point.is_none() {
            return 0;
        }
        let mut list: wifi_sta_list_t = unsafe { core::mem::zeroed() };
        let ret = unsafe { esp_wifi_ap_get_sta_list(&mut list) };
        if ret == ESP_OK {
            list.num.clamp(0, i32::from(u8::MAX)) as u8
        } else {
            0
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn station_count(&self) -> u8 {
        0
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
