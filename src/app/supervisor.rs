//! Connection supervisor: the hexagonal core.
//!
//! [`ConnectionSupervisor`] owns the credentials, the status register and
//! the association state machine.  All radio I/O flows through the
//! [`WifiDriver`] port; events arrive through [`EventSource`]; diagnostics
//! leave through [`EventSink`].
//!
//! ```text
//!   EventSource ──▶ EventCorrelator ──▶ inbox ─┐
//!                        │                     ▼
//!                        ▼            ┌────────────────────────┐ ──▶ EventSink
//!                  StatusRegister ◀───│  ConnectionSupervisor  │
//!                                     │  begin · poll · retry  │ ──▶ WifiDriver
//!                                     └────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! `configure_*` → `begin` (once) → loop { `service_events`, `update_status`,
//! `maybe_retry` }.  The operating mode is fixed when `begin` runs; changing
//! it means building a new supervisor.

use core::net::Ipv4Addr;
use std::sync::Arc;

use log::{error, info, warn};

use crate::association::{AssociationAttempt, AssociationPhase};
use crate::config::SupervisorConfig;
use crate::correlator::{Correlation, CorrelationInbox, EventCorrelator};
use crate::credentials::{AccessPointCredentials, NetworkCredentials, Ssid};
use crate::diagnostics::{AccessPointReport, ClientReport, StatusReport};
use crate::error::{ConfigurationError, DriverError, Result, SupervisorError};
use crate::identity::{self, Hostname, HostnamePrefix, MacAddress};
use crate::reconnect::{ReconnectionPolicy, RetryDecision};
use crate::status::{ConnectionState, StatusRecord, StatusRegister};

use super::events::{DriverEvent, DriverEventKind, SupervisorEvent};
use super::ports::{Clock, EventSink, EventSource, OperatingMode, WifiDriver};

// ───────────────────────────────────────────────────────────────
// Begin report
// ───────────────────────────────────────────────────────────────

/// The soft-AP that was actually started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointOutcome {
    pub ssid: Ssid,
    pub open: bool,
    /// A too-short secret was dropped in favour of an open AP.
    pub downgraded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationOutcome {
    /// No client network configured (or AP-only mode); nothing attempted.
    Skipped,
    /// Request issued; drive it with `poll_association`.
    Pending,
    Connected { elapsed_ms: u64 },
    TimedOut { waited_ms: u64 },
    /// The driver refused the association request.
    Rejected(DriverError),
}

/// What `begin` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginReport {
    pub mode: OperatingMode,
    pub access_point: Option<AccessPointOutcome>,
    pub association: AssociationOutcome,
    pub hostname: Hostname,
}

impl BeginReport {
    /// Fold a timed-out or rejected association into an error for `?` users.
    pub fn into_result(self) -> Result<Self> {
        match self.association {
            AssociationOutcome::TimedOut { waited_ms } => {
                Err(SupervisorError::Timeout { waited_ms })
            }
            AssociationOutcome::Rejected(e) => Err(SupervisorError::DriverRejection(e)),
            _ => Ok(self),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectionSupervisor
// ───────────────────────────────────────────────────────────────

pub struct ConnectionSupervisor<D, C, S> {
    driver: D,
    clock: C,
    sink: S,
    config: SupervisorConfig,
    client: Option<NetworkCredentials>,
    access_point: AccessPointCredentials,
    hostname: Option<Hostname>,
    hostname_prefix: HostnamePrefix,
    register: Arc<StatusRegister>,
    correlator: EventCorrelator,
    inbox: Arc<CorrelationInbox>,
    policy: ReconnectionPolicy,
    association: AssociationAttempt,
    /// `Some` once `begin` has run.
    mode: Option<OperatingMode>,
    access_point_ssid: Option<Ssid>,
    /// Reference point for `maybe_retry` after a retry was issued.
    last_retry_ms: Option<u64>,
}

impl<D, C, S> ConnectionSupervisor<D, C, S>
where
    D: WifiDriver,
    C: Clock,
    S: EventSink,
{
    /// Build an uninitialised supervisor.  Touches nothing on the driver.
    pub fn new(driver: D, clock: C, sink: S, config: SupervisorConfig) -> Self {
        let access_point = AccessPointCredentials::new(
            &config.default_ap_ssid,
            &config.default_ap_passphrase,
        )
        .unwrap_or_else(|e| {
            warn!("[WiFi] default AP identity invalid ({}), using built-in", e);
            AccessPointCredentials::default()
        });
        let register = Arc::new(StatusRegister::new());
        Self {
            driver,
            clock,
            sink,
            hostname_prefix: config.hostname_prefix.clone(),
            policy: ReconnectionPolicy::new(config.retry_on_link_loss),
            config,
            client: None,
            access_point,
            hostname: None,
            correlator: EventCorrelator::new(Arc::clone(&register)),
            register,
            inbox: Arc::new(CorrelationInbox::new()),
            association: AssociationAttempt::new(),
            mode: None,
            access_point_ssid: None,
            last_retry_ms: None,
        }
    }

    // ── Configuration ─────────────────────────────────────────

    /// Store the client network.  Empty SSID → ignored, error returned.
    pub fn configure_client(&mut self, ssid: &str, passphrase: &str) -> Result<()> {
        match NetworkCredentials::new(ssid, passphrase) {
            Ok(creds) => {
                info!("[WiFi] client network set (SSID='{}')", creds.ssid());
                self.client = Some(creds);
                Ok(())
            }
            Err(e) => {
                warn!("[WiFi] client credentials ignored: {}", e);
                Err(e.into())
            }
        }
    }

    /// Store the soft-AP identity.  A secret shorter than 8 characters is
    /// accepted here and downgraded to an open AP when `begin` starts it.
    pub fn configure_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<()> {
        match AccessPointCredentials::new(ssid, passphrase) {
            Ok(creds) => {
                info!("[WiFi] access point identity set (SSID='{}')", creds.ssid());
                self.access_point = creds;
                Ok(())
            }
            Err(e) => {
                warn!("[WiFi] access point credentials ignored: {}", e);
                Err(e.into())
            }
        }
    }

    /// Explicit device name.  Re-applied immediately when already
    /// initialised; see [`crate::identity`] for the caveat while connected.
    pub fn set_hostname(&mut self, name: &str) -> Result<()> {
        self.hostname = Some(identity::hostname(name)?);
        if self.is_initialized() {
            self.apply_identity();
        }
        Ok(())
    }

    /// Prefix for the derived device name (used when no explicit name is set).
    pub fn set_hostname_prefix(&mut self, prefix: &str) -> Result<()> {
        self.hostname_prefix = identity::hostname_prefix(prefix)?;
        if self.is_initialized() {
            self.apply_identity();
        }
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Initialise the radio and, if a client network is configured, wait
    /// (bounded by `timeout_ms`) for association.
    ///
    /// Blocks at most `timeout_ms` plus one status poll interval.  A second
    /// call returns [`SupervisorError::AlreadyInitialized`] without touching
    /// the driver or the status record.
    pub fn begin(&mut self, enable_access_point: bool, timeout_ms: u32) -> Result<BeginReport> {
        let (mode, access_point, hostname) = self.initialize(enable_access_point)?;
        let mut association = self.start_association(timeout_ms);
        if association == AssociationOutcome::Pending {
            association = self.wait_for_association();
        }
        self.update_status();
        self.finish_begin(mode);

        match association {
            AssociationOutcome::Connected { elapsed_ms } => {
                info!(
                    "[WiFi] connected in {} ms | IP {} | gateway {} | DNS {} | MAC {}",
                    elapsed_ms,
                    display_ip(self.local_ip()),
                    display_ip(self.gateway_ip()),
                    display_ip(self.dns_ip()),
                    self.mac_string(),
                );
            }
            AssociationOutcome::TimedOut { waited_ms } => {
                warn!("[WiFi] association failed after {} ms", waited_ms);
            }
            _ => {}
        }

        Ok(BeginReport {
            mode,
            access_point,
            association,
            hostname,
        })
    }

    /// Configure the client network, then [`begin`](Self::begin).
    pub fn begin_with(
        &mut self,
        ssid: &str,
        passphrase: &str,
        enable_access_point: bool,
        timeout_ms: u32,
    ) -> Result<BeginReport> {
        self.configure_client(ssid, passphrase)?;
        self.begin(enable_access_point, timeout_ms)
    }

    /// Same set-up as [`begin`](Self::begin) but returns right after the
    /// association request.  Drive it with [`poll_association`](Self::poll_association).
    pub fn begin_nonblocking(
        &mut self,
        enable_access_point: bool,
        timeout_ms: u32,
    ) -> Result<BeginReport> {
        let (mode, access_point, hostname) = self.initialize(enable_access_point)?;
        let association = self.start_association(timeout_ms);
        self.finish_begin(mode);
        Ok(BeginReport {
            mode,
            access_point,
            association,
            hostname,
        })
    }

    /// Step function of the association state machine.  Refreshes status
    /// once while connecting; otherwise just reports the phase.
    pub fn poll_association(&mut self) -> AssociationPhase {
        if !matches!(self.association.phase(), AssociationPhase::Connecting { .. }) {
            return self.association.phase();
        }
        let connected = self.update_status() == ConnectionState::Connected;
        self.association.step(connected, self.clock.now_ms())
    }

    pub fn association_phase(&self) -> AssociationPhase {
        self.association.phase()
    }

    // ── Status ────────────────────────────────────────────────

    /// Polling fallback: re-read the driver and record any change.
    pub fn update_status(&mut self) -> ConnectionState {
        let observed = self.driver.status();
        if let Some(t) = self.register.record(observed, self.clock.now_ms()) {
            info!("[WiFi] status changed: {} - {}", t.to.code(), t.to.label());
            self.sink.emit(&SupervisorEvent::StatusChanged {
                from: t.from,
                to: t.to,
                at_ms: t.at_ms,
            });
        }
        self.register.state()
    }

    /// Refresh, then report whether the station is associated with an address.
    pub fn is_connected(&mut self) -> bool {
        self.update_status() == ConnectionState::Connected
    }

    /// Last recorded status.  No refresh, no side effects.
    pub fn read(&self) -> StatusRecord {
        self.register.read()
    }

    /// Shared handle for read-only observers on other tasks.
    pub fn status_register(&self) -> Arc<StatusRegister> {
        Arc::clone(&self.register)
    }

    // ── Link control ──────────────────────────────────────────

    /// Tear down and re-request association with the stored credentials,
    /// whatever the current state.  Does not wait for the outcome.
    pub fn reconnect(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(SupervisorError::NotInitialized);
        }
        let Some(creds) = self.client.clone() else {
            warn!("[WiFi] reconnect ignored: no client network configured");
            return Err(ConfigurationError::MissingClientCredentials.into());
        };
        info!("[WiFi] reconnecting to '{}'", creds.ssid());
        if let Err(e) = self.driver.disconnect() {
            warn!("[WiFi] tear-down before reconnect failed: {}", e);
        }
        self.clock.sleep_ms(self.config.reconnect_settle_ms);
        let issued = self.request_association(&creds);
        self.update_status();
        issued
    }

    /// Drop the client association.  The soft-AP (if any) stays up.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(SupervisorError::NotInitialized);
        }
        info!("[WiFi] disconnecting client");
        self.driver.disconnect()?;
        self.update_status();
        Ok(())
    }

    /// Application-driven retry: once the link has been down for
    /// `retry_backoff_ms`, re-issue association.  Returns whether it did.
    pub fn maybe_retry(&mut self) -> bool {
        if !self.mode.is_some_and(OperatingMode::has_client) {
            return false;
        }
        let record = self.read();
        if record.state == ConnectionState::Connected {
            self.last_retry_ms = None;
            return false;
        }
        let since = self
            .last_retry_ms
            .map_or(record.changed_at_ms, |t| t.max(record.changed_at_ms));
        let now = self.clock.now_ms();
        let issued = self.policy.maybe_retry(
            &mut self.driver,
            self.client.as_ref(),
            now,
            since,
            u64::from(self.config.retry_backoff_ms),
        );
        if issued {
            self.last_retry_ms = Some(now);
            self.emit_association_requested();
        }
        issued
    }

    // ── Events ────────────────────────────────────────────────

    /// Correlate and act on one event in the caller's context.
    pub fn handle_event(&mut self, event: DriverEvent) {
        let correlation = self.correlator.correlate(event, self.clock.now_ms());
        self.act_on(correlation);
    }

    /// Drain correlations queued by handlers installed with [`attach`](Self::attach).
    pub fn service_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(correlation) = self.inbox.try_receive() {
            self.act_on(correlation);
            handled += 1;
        }
        handled
    }

    // ── Read-only network queries ─────────────────────────────

    pub fn local_ip(&self) -> Option<Ipv4Addr> {
        self.driver.local_ip()
    }

    pub fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.driver.access_point_ip()
    }

    pub fn gateway_ip(&self) -> Option<Ipv4Addr> {
        self.driver.gateway_ip()
    }

    pub fn dns_ip(&self) -> Option<Ipv4Addr> {
        self.driver.dns_ip()
    }

    pub fn ssid(&self) -> Option<Ssid> {
        self.driver.ssid()
    }

    pub fn rssi(&self) -> Option<i8> {
        self.driver.rssi()
    }

    pub fn mac_address(&self) -> MacAddress {
        self.driver.mac_address()
    }

    /// Name the driver reports, else the one `begin` would apply.
    pub fn hostname(&self) -> Hostname {
        self.driver.hostname().unwrap_or_else(|| self.resolved_hostname())
    }

    pub fn station_count(&self) -> u8 {
        self.driver.station_count()
    }

    pub fn mode(&self) -> Option<OperatingMode> {
        self.mode
    }

    pub fn is_initialized(&self) -> bool {
        self.mode.is_some()
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Diagnostics ───────────────────────────────────────────

    /// Snapshot for dumps.  `detailed` adds client and AP sections.
    pub fn status_report(&self, detailed: bool) -> StatusReport {
        let record = self.read();
        let mut report = StatusReport {
            code: record.state.code(),
            state: record.state,
            label: record.label,
            since_change_secs: record.age_ms(self.clock.now_ms()) / 1000,
            initialized: self.is_initialized(),
            mode: self.mode,
            client: None,
            access_point: None,
        };
        if !detailed {
            return report;
        }
        if record.state == ConnectionState::Connected {
            report.client = Some(ClientReport {
                ip: self.local_ip(),
                gateway: self.gateway_ip(),
                dns: self.dns_ip(),
                mac: self.mac_string(),
                hostname: self.hostname(),
                rssi: self.rssi(),
                ssid: self.ssid(),
            });
        }
        if let Some(ssid) = &self.access_point_ssid {
            report.access_point = Some(AccessPointReport {
                ssid: ssid.clone(),
                ip: self.access_point_ip(),
                stations: self.station_count(),
            });
        }
        report
    }

    /// Refresh, then log the status dump.
    pub fn print_status(&mut self, detailed: bool) {
        self.update_status();
        self.status_report(detailed).log();
    }

    // ── Internal ──────────────────────────────────────────────

    fn initialize(
        &mut self,
        enable_access_point: bool,
    ) -> Result<(OperatingMode, Option<AccessPointOutcome>, Hostname)> {
        if self.is_initialized() {
            info!("[WiFi] already initialised, begin ignored");
            return Err(SupervisorError::AlreadyInitialized);
        }
        info!("=== WiFi initialisation ===");

        let mode = OperatingMode::derive(enable_access_point, self.client.is_some());
        // Initialised from here on, whatever the driver says next.
        self.mode = Some(mode);
        info!("[WiFi] mode: {}", mode);

        if let Err(e) = self.driver.set_mode(mode) {
            error!("[WiFi] driver refused mode {}: {}", mode, e);
            return Err(e.into());
        }

        let access_point = if mode.has_access_point() {
            Some(self.start_access_point()?)
        } else {
            None
        };

        let hostname = self.apply_identity();
        Ok((mode, access_point, hostname))
    }

    fn start_access_point(&mut self) -> Result<AccessPointOutcome> {
        let plan = self.access_point.plan();
        info!("[AP] starting '{}' ({})", plan.ssid, if plan.is_open() { "open" } else { "WPA2" });
        if let Err(e) = self
            .driver
            .start_access_point(&plan.ssid, plan.passphrase.as_deref())
        {
            error!("[AP] driver refused to start access point: {}", e);
            return Err(e.into());
        }
        info!("[AP] IP: {}", display_ip(self.access_point_ip()));
        self.access_point_ssid = Some(plan.ssid.clone());
        self.sink.emit(&SupervisorEvent::AccessPointStarted {
            ssid: plan.ssid.clone(),
            open: plan.is_open(),
        });
        Ok(AccessPointOutcome {
            open: plan.is_open(),
            downgraded: plan.downgraded,
            ssid: plan.ssid,
        })
    }

    fn resolved_hostname(&self) -> Hostname {
        identity::resolve_hostname(
            self.hostname.as_ref(),
            &self.hostname_prefix,
            &self.driver.mac_address(),
        )
    }

    fn apply_identity(&mut self) -> Hostname {
        let name = self.resolved_hostname();
        if self.register.state() == ConnectionState::Connected {
            warn!(
                "[WiFi] hostname '{}' applied while connected; peers see it after the next DHCP lease or interface restart",
                name
            );
        }
        match self.driver.set_hostname(&name) {
            Ok(()) => info!("[WiFi] hostname: {}", name),
            Err(e) => warn!("[WiFi] hostname '{}' not applied: {}", name, e),
        }
        name
    }

    fn start_association(&mut self, timeout_ms: u32) -> AssociationOutcome {
        let wants_client = self.mode.is_some_and(OperatingMode::has_client);
        let Some(creds) = self.client.clone().filter(|_| wants_client) else {
            info!("[WiFi] no client network configured, skipping association");
            return AssociationOutcome::Skipped;
        };
        match self.request_association(&creds) {
            Ok(()) => {
                self.association.start(self.clock.now_ms(), timeout_ms);
                AssociationOutcome::Pending
            }
            Err(SupervisorError::DriverRejection(e)) => AssociationOutcome::Rejected(e),
            Err(_) => AssociationOutcome::Rejected(DriverError::Platform("begin_association")),
        }
    }

    /// Bounded blocking wrapper around the step function.
    fn wait_for_association(&mut self) -> AssociationOutcome {
        let interval = self.config.status_poll_interval_ms.max(1);
        loop {
            match self.poll_association() {
                AssociationPhase::Connected { elapsed_ms } => {
                    return AssociationOutcome::Connected { elapsed_ms };
                }
                AssociationPhase::TimedOut { waited_ms } => {
                    return AssociationOutcome::TimedOut { waited_ms };
                }
                // Idle cannot happen after a successful start; treat as done.
                AssociationPhase::Idle => return AssociationOutcome::Skipped,
                AssociationPhase::Connecting { .. } => self.clock.sleep_ms(interval),
            }
        }
    }

    fn request_association(&mut self, creds: &NetworkCredentials) -> Result<()> {
        info!("[WiFi] associating with '{}'", creds.ssid());
        if let Err(e) = self.driver.begin_association(creds.ssid(), creds.passphrase()) {
            warn!("[WiFi] association request rejected: {}", e);
            return Err(e.into());
        }
        self.emit_association_requested();
        Ok(())
    }

    fn emit_association_requested(&mut self) {
        if let Some(creds) = &self.client {
            let mut ssid = Ssid::new();
            let _ = ssid.push_str(creds.ssid());
            self.sink.emit(&SupervisorEvent::AssociationRequested { ssid });
        }
    }

    fn finish_begin(&mut self, mode: OperatingMode) {
        self.sink.emit(&SupervisorEvent::Initialized(mode));
        info!("=== WiFi initialised ({}) ===", self.read().label);
    }

    fn act_on(&mut self, correlation: Correlation) {
        for notice in correlation.notices() {
            if let SupervisorEvent::StatusChanged { to, .. } = notice {
                info!("[WiFi] status changed: {} - {}", to.code(), to.label());
            }
            self.sink.emit(&notice);
        }
        if !correlation.link_lost {
            return;
        }
        match self.policy.on_link_lost(&mut self.driver, self.client.as_ref()) {
            RetryDecision::Issued => self.emit_association_requested(),
            RetryDecision::NoCredentials | RetryDecision::Disabled => {}
            RetryDecision::Rejected(e) => warn!("[WiFi] immediate retry failed: {}", e),
        }
    }

    fn mac_string(&self) -> identity::MacString {
        identity::format_mac(&self.driver.mac_address())
    }
}

impl<D, C, S> ConnectionSupervisor<D, C, S>
where
    D: WifiDriver,
    C: Clock + Clone + Send + 'static,
    S: EventSink,
{
    /// Subscribe to every driver event kind.  Handlers record transitions
    /// on the event context and queue follow-ups for [`service_events`](Self::service_events).
    pub fn attach(&mut self, source: &mut impl EventSource) -> Result<()> {
        for kind in DriverEventKind::ALL {
            let handler = self
                .correlator
                .handler(Arc::clone(&self.inbox), self.clock.clone());
            source.subscribe(kind, handler)?;
        }
        info!("[WiFi] event handlers attached");
        Ok(())
    }
}

fn display_ip(ip: Option<Ipv4Addr>) -> Ipv4Addr {
    ip.unwrap_or(Ipv4Addr::UNSPECIFIED)
}
