//! Station configuration.
//!
//! # Components
//!
//! - [`wifi`] - connection profile (SSID, password, retry budget), host-testable
//!
//! Credentials are never persisted by this crate. The firmware takes them at
//! compile time, the host simulator from the environment.

mod wifi;

pub use wifi::{
    ConfigError, ConnectionProfile, CONNECTION_TIMEOUT_SECS, DEFAULT_MAX_RETRY, ENV_MAX_RETRY,
    ENV_PASSWORD, ENV_SSID, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN,
};
