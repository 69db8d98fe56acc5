//! WiFi connection supervisor library.
//!
//! Tracks the station's connection state, correlates driver events into
//! status transitions, and re-requests association when the link drops.
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod association;
pub mod config;
pub mod correlator;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod reconnect;
pub mod status;

pub mod adapters;

pub use app::supervisor::{AssociationOutcome, BeginReport, ConnectionSupervisor};
pub use error::{Result, SupervisorError};
pub use status::{ConnectionState, StatusRecord, StatusRegister};
