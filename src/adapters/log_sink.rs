//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing supervisor events to the ESP-IDF
//! logger (UART / USB-CDC in production), one tagged line per event.

use log::{info, warn};

use crate::app::events::SupervisorEvent;
use crate::app::ports::EventSink;
use crate::identity::format_mac;

/// Adapter that logs every [`SupervisorEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SupervisorEvent) {
        match event {
            SupervisorEvent::StatusChanged { from, to, at_ms } => {
                info!("LINK | {} -> {} | code={} | t={}ms", from, to, to.code(), at_ms);
            }
            SupervisorEvent::AddressAcquired(ip) => {
                info!("LINK | address {}", ip);
            }
            SupervisorEvent::LinkLost(reason) => {
                warn!("LINK | lost, reason {}", reason);
            }
            SupervisorEvent::AssociationRequested { ssid } => {
                info!("LINK | associating with '{}'", ssid);
            }
            SupervisorEvent::AccessPointStarted { ssid, open } => {
                info!("AP | started '{}' | {}", ssid, if *open { "open" } else { "WPA2" });
            }
            SupervisorEvent::StationJoined(mac) => {
                info!("AP | station joined {}", format_mac(mac));
            }
            SupervisorEvent::StationLeft(mac) => {
                info!("AP | station left {}", format_mac(mac));
            }
            SupervisorEvent::Initialized(mode) => {
                info!("START | mode={}", mode);
            }
        }
    }
}
