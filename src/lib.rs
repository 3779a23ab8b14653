//! ESP32 station-mode connection manager.
//!
//! This library drives a WiFi station interface through association, bounded
//! reassociation retries and address acquisition. The state machine and its
//! synchronization are platform-independent and tested on the host; the
//! ESP-IDF adapter is built with the `esp32` feature.

pub mod config;
pub mod network;
pub mod report;
pub mod wifi;

// Re-export commonly used items
pub use config::{ConfigError, ConnectionProfile};
pub use network::{AddressInfo, AddressResolver, LinkError, ScriptedStation, StationLink};
pub use report::NetworkReport;
pub use wifi::{
    BeginError, ConnectionManager, ConnectionState, DisassociationReason, Handle, Outcome,
    StationEvent, WaitError,
};
