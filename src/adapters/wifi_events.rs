//! ESP-IDF system event loop adapter.
//!
//! Implements [`EventSource`] on top of `EspSystemEventLoop`.  Each
//! subscription filters the raw WiFi / IP events down to one
//! [`DriverEventKind`] and forwards it to the supervisor's handler, which
//! runs on the event loop task.
//!
//! Subscriptions are kept alive for the lifetime of the adapter; dropping
//! it unsubscribes everything.

use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::wifi::WifiEvent;
use log::{debug, info};

use crate::app::events::{DisconnectReason, DriverEvent, DriverEventKind};
use crate::app::ports::{EventHandler, EventSource};
use crate::error::DriverError;

pub struct EspEventSource {
    sysloop: EspSystemEventLoop,
    subscriptions: Vec<EspSubscription<'static, System>>,
}

impl EspEventSource {
    pub fn new(sysloop: EspSystemEventLoop) -> Self {
        Self {
            sysloop,
            subscriptions: Vec::with_capacity(DriverEventKind::ALL.len()),
        }
    }
}

impl EventSource for EspEventSource {
    fn subscribe(
        &mut self,
        kind: DriverEventKind,
        mut handler: EventHandler,
    ) -> Result<(), DriverError> {
        let subscription = match kind {
            DriverEventKind::AddressAcquired => self.sysloop.subscribe::<IpEvent, _>(move |event| {
                if let IpEvent::DhcpIpAssigned(assignment) = event {
                    handler(DriverEvent::AddressAcquired {
                        ip: assignment.ip(),
                    });
                }
            }),
            DriverEventKind::StationDisconnected => {
                self.sysloop.subscribe::<WifiEvent, _>(move |event| {
                    if let WifiEvent::StaDisconnected(info) = event {
                        handler(DriverEvent::StationDisconnected {
                            reason: DisconnectReason(info.reason()),
                        });
                    }
                })
            }
            DriverEventKind::AccessPointStationJoined => {
                self.sysloop.subscribe::<WifiEvent, _>(move |event| {
                    if let WifiEvent::ApStaConnected(info) = event {
                        handler(DriverEvent::AccessPointStationJoined { mac: info.mac() });
                    }
                })
            }
            DriverEventKind::AccessPointStationLeft => {
                self.sysloop.subscribe::<WifiEvent, _>(move |event| {
                    if let WifiEvent::ApStaDisconnected(info) = event {
                        handler(DriverEvent::AccessPointStationLeft { mac: info.mac() });
                    }
                })
            }
        }
        .map_err(|_| DriverError::SubscriptionFailed)?;

        debug!("events: subscribed {:?}", kind);
        self.subscriptions.push(subscription);
        if self.subscriptions.len() == DriverEventKind::ALL.len() {
            info!("events: all WiFi/IP subscriptions active");
        }
        Ok(())
    }
}
