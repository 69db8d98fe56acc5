//! Integration tests for event-context correlation.
//!
//! Handlers installed by `attach` run on the (fake) platform event task:
//! they record transitions immediately and queue follow-ups that the
//! application loop drains with `service_events`.

use std::net::Ipv4Addr;

use wifi_supervisor::app::events::{DisconnectReason, DriverEvent, SupervisorEvent};
use wifi_supervisor::app::supervisor::ConnectionSupervisor;
use wifi_supervisor::config::SupervisorConfig;
use wifi_supervisor::correlator::INBOX_DEPTH;
use wifi_supervisor::error::{DriverError, SupervisorError};
use wifi_supervisor::status::ConnectionState;

use crate::mock_driver::{FakeEventSource, ManualClock, MockDriver, RecordingSink};

const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

fn attached(
    driver: &MockDriver,
    clock: &ManualClock,
) -> (ConnectionSupervisor<MockDriver, ManualClock, RecordingSink>, FakeEventSource) {
    let mut sup = ConnectionSupervisor::new(
        driver.clone(),
        clock.clone(),
        RecordingSink::new(),
        SupervisorConfig::default(),
    );
    let mut source = FakeEventSource::new();
    sup.attach(&mut source).unwrap();
    (sup, source)
}

#[test]
fn attach_subscribes_every_event_kind() {
    let clock = ManualClock::new();
    let driver = MockDriver::new(clock.clone());
    let (_sup, source) = attached(&driver, &clock);
    assert_eq!(source.subscribed(), 4);
}

#[test]
fn attach_reports_subscription_failure() {
    let clock = ManualClock::new();
    let driver = MockDriver::new(clock.clone());
    let mut sup = ConnectionSupervisor::new(
        driver.clone(),
        clock.clone(),
        RecordingSink::new(),
        SupervisorConfig::default(),
    );
    let mut source = FakeEventSource::new();
    source.refuse = true;
    assert_eq!(
        sup.attach(&mut source),
        Err(SupervisorError::DriverRejection(DriverError::SubscriptionFailed))
    );
}

#[test]
fn transition_is_recorded_on_event_context() {
    let clock = ManualClock::new();
    let driver = MockDriver::new(clock.clone());
    let (mut sup, mut source) = attached(&driver, &clock);
    sup.begin(false, 0).unwrap();
    let register = sup.status_register();

    clock.advance(120);
    source.fire(DriverEvent::AddressAcquired { ip: IP });

    // Recorded before the application loop runs.
    assert_eq!(register.state(), ConnectionState::Connected);
    assert_eq!(register.read().changed_at_ms, 120);
    assert!(!sup.sink().events.contains(&SupervisorEvent::AddressAcquired(IP)));

    assert_eq!(sup.service_events(), 1);
    assert_eq!(sup.sink().transitions_to(ConnectionState::Connected), 1);
    assert!(sup.sink().events.contains(&SupervisorEvent::AddressAcquired(IP)));
    assert_eq!(sup.service_events(), 0);
}

#[test]
fn link_loss_retry_runs_in_application_context() {
    let clock = ManualClock::new();
    let driver = MockDriver::joining_after(clock.clone(), 0);
    let (mut sup, mut source) = attached(&driver, &clock);
    sup.configure_client("HomeNet", "password1").unwrap();
    sup.begin(false, 1_000).unwrap();
    assert_eq!(driver.association_count(), 1);

    source.fire(DriverEvent::StationDisconnected {
        reason: DisconnectReason::BEACON_TIMEOUT,
    });
    assert_eq!(sup.read().state, ConnectionState::ConnectionLost);
    assert_eq!(driver.association_count(), 1, "driver untouched from event context");

    sup.service_events();
    assert_eq!(driver.association_count(), 2);
    assert_eq!(sup.sink().association_requests(), 2);
    assert!(sup
        .sink()
        .events
        .contains(&SupervisorEvent::LinkLost(DisconnectReason::BEACON_TIMEOUT)));
}

#[test]
fn disconnect_without_credentials_only_records() {
    let clock = ManualClock::new();
    let driver = MockDriver::new(clock.clone());
    let (mut sup, mut source) = attached(&driver, &clock);
    sup.begin(false, 0).unwrap();

    source.fire(DriverEvent::AddressAcquired { ip: IP });
    source.fire(DriverEvent::StationDisconnected {
        reason: DisconnectReason::AUTH_FAIL,
    });
    assert_eq!(sup.service_events(), 2);

    assert_eq!(sup.read().state, ConnectionState::ConnectionLost);
    assert_eq!(driver.association_count(), 0);
}

#[test]
fn station_events_are_observability_only() {
    let clock = ManualClock::new();
    let driver = MockDriver::new(clock.clone());
    let (mut sup, mut source) = attached(&driver, &clock);
    sup.begin(true, 0).unwrap();
    let before = sup.read();
    let mac = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60];

    source.fire(DriverEvent::AccessPointStationJoined { mac });
    source.fire(DriverEvent::AccessPointStationLeft { mac });
    sup.service_events();

    assert_eq!(sup.read(), before);
    let events = &sup.sink().events;
    assert!(events.contains(&SupervisorEvent::StationJoined(mac)));
    assert!(events.contains(&SupervisorEvent::StationLeft(mac)));
}

#[test]
fn full_inbox_drops_follow_ups_but_keeps_transitions() {
    let clock = ManualClock::new();
    let driver = MockDriver::new(clock.clone());
    let (mut sup, mut source) = attached(&driver, &clock);
    sup.begin(true, 0).unwrap();

    for _ in 0..INBOX_DEPTH {
        source.fire(DriverEvent::AccessPointStationJoined { mac: [1; 6] });
    }
    clock.advance(10);
    source.fire(DriverEvent::AddressAcquired { ip: IP });

    assert_eq!(sup.read().state, ConnectionState::Connected);
    assert_eq!(sup.service_events(), INBOX_DEPTH);
    assert_eq!(sup.sink().transitions_to(ConnectionState::Connected), 0);

    // Polling catches nothing new: the edge is already in the register.
    driver.force(ConnectionState::Connected);
    sup.update_status();
    assert_eq!(sup.read().changed_at_ms, 10);
}
