//! Fuzz target: `SupervisorConfig::from_json`
//!
//! Feeds arbitrary bytes to the JSON override parser and verifies:
//! - No panics under arbitrary byte inputs
//! - Anything accepted also passes `validate()`
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use wifi_supervisor::config::SupervisorConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = SupervisorConfig::from_json(data) {
        assert!(cfg.validate().is_ok(), "accepted config failed validation");
        assert!(cfg.status_poll_interval_ms <= cfg.connect_timeout_ms);
    }
});
