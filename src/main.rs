//! WiFi supervisor firmware: ESP32 entry point.
//!
//! Brings up the radio in client mode (plus soft-AP for set-up), then runs
//! the cooperative supervision loop: drain event follow-ups, poll status,
//! retry a dropped link every 30 s, dump status once a minute.
//!
//! Credentials come from the build environment (`WIFI_SSID`, `WIFI_PASS`);
//! an optional JSON override for [`SupervisorConfig`] can be baked in with
//! `WIFI_SUPERVISOR_CONFIG`.

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use wifi_supervisor::adapters::log_sink::LogEventSink;
use wifi_supervisor::adapters::time::Esp32Clock;
use wifi_supervisor::adapters::wifi::Esp32WifiDriver;
use wifi_supervisor::adapters::wifi_events::EspEventSource;
use wifi_supervisor::app::ports::Clock;
use wifi_supervisor::app::supervisor::{AssociationOutcome, ConnectionSupervisor};
use wifi_supervisor::config::SupervisorConfig;

const LOOP_PERIOD_MS: u32 = 100;
const STATUS_DUMP_PERIOD_MS: u64 = 60_000;

fn load_config() -> SupervisorConfig {
    let Some(json) = option_env!("WIFI_SUPERVISOR_CONFIG") else {
        return SupervisorConfig::default();
    };
    match SupervisorConfig::from_json(json.as_bytes()) {
        Ok(cfg) => {
            info!("Config override applied");
            cfg
        }
        Err(e) => {
            warn!("Config override rejected ({}), using defaults", e);
            SupervisorConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WiFi supervisor v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Platform handles ───────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;

    // ── 3. Supervisor ─────────────────────────────────────────
    let config = load_config();
    let clock = Esp32Clock::new();
    let timeout_ms = config.connect_timeout_ms;
    let mut supervisor = ConnectionSupervisor::new(
        Esp32WifiDriver::new(wifi),
        clock,
        LogEventSink::new(),
        config,
    );

    match (option_env!("WIFI_SSID"), option_env!("WIFI_PASS")) {
        (Some(ssid), pass) => {
            if let Err(e) = supervisor.configure_client(ssid, pass.unwrap_or("")) {
                warn!("Client network not configured: {}", e);
            }
        }
        (None, _) => warn!("WIFI_SSID not set at build time, running AP only"),
    }

    let mut events = EspEventSource::new(sysloop);
    supervisor.attach(&mut events)?;

    // ── 4. Bring-up ───────────────────────────────────────────
    let report = supervisor.begin(true, timeout_ms)?;
    if let Some(ap) = &report.access_point {
        if ap.downgraded {
            warn!("AP '{}' is OPEN: configured secret too short", ap.ssid);
        }
    }
    if let AssociationOutcome::TimedOut { .. } = report.association {
        warn!("Association pending; the loop will keep retrying");
    }
    supervisor.print_status(true);

    // ── 5. Supervision loop ───────────────────────────────────
    let mut last_dump_ms = clock.now_ms();
    loop {
        supervisor.service_events();
        supervisor.update_status();
        if supervisor.maybe_retry() {
            info!("Link down for {} ms, retry issued", supervisor.config().retry_backoff_ms);
        }

        let now = clock.now_ms();
        if now.saturating_sub(last_dump_ms) >= STATUS_DUMP_PERIOD_MS {
            supervisor.print_status(false);
            last_dump_ms = now;
        }

        clock.sleep_ms(LOOP_PERIOD_MS);
    }
}
