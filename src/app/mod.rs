//! Application core: pure domain logic, zero I/O.
//!
//! The connection supervisor and the vocabulary it speaks.  All
//! interaction with the radio happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real hardware.

pub mod events;
pub mod ports;
pub mod supervisor;
