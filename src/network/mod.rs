//! Link-layer collaborators of the connection manager.
//!
//! The state machine never talks to a radio directly. It drives a
//! [`StationLink`] (bring the interface up, request association, tear down)
//! and queries an [`AddressResolver`] once DHCP reports an address.
//!
//! - **ESP32** (`esp32` feature): [`EspStation`] implements both on top of ESP-IDF
//! - **Host**: [`ScriptedStation`] records requests and serves a canned address
//!
//! Both traits are implemented for `Arc<T>`, so one station object can serve
//! as link and resolver while the caller keeps a handle to it.

use crate::config::ConnectionProfile;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;

mod host;
mod status_server;
#[cfg(feature = "esp32")]
mod wifi;

pub use host::ScriptedStation;
pub use status_server::{StatusServer, StatusSource, DEFAULT_STATUS_PORT};
#[cfg(feature = "esp32")]
pub use wifi::{subscribe_events, EspStation, EventBridge};

/// Address assignment of the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressInfo {
    /// Assigned IPv4 address.
    pub address: Ipv4Addr,
    /// Subnet mask.
    pub netmask: Ipv4Addr,
    /// Default gateway.
    pub gateway: Ipv4Addr,
}

impl AddressInfo {
    /// Build from an address, a prefix length and a gateway.
    pub fn from_prefix(address: Ipv4Addr, prefix_len: u8, gateway: Ipv4Addr) -> Self {
        Self {
            address,
            netmask: prefix_to_netmask(prefix_len),
            gateway,
        }
    }
}

/// Convert a CIDR prefix length into a dotted netmask. Lengths above 32 saturate.
pub fn prefix_to_netmask(prefix_len: u8) -> Ipv4Addr {
    let bits = u32::from(prefix_len.min(32));
    let mask = u32::MAX.checked_shl(32 - bits).unwrap_or(0);
    Ipv4Addr::from(mask)
}

/// Driver side of a station interface.
///
/// Methods are called with the manager's transition lock held, from either the
/// caller's context (`start`, `stop`) or the event callback (`associate`).
/// Implementations must not block waiting for events.
pub trait StationLink: Send + Sync {
    /// Configure the interface for `profile` and bring it up.
    ///
    /// A started interface is expected to report
    /// [`StationEvent::InterfaceStarted`](crate::wifi::StationEvent::InterfaceStarted),
    /// or, if it was already running, to issue the association request itself.
    fn start(&self, profile: &ConnectionProfile) -> Result<(), LinkError>;

    /// Issue one association request.
    fn associate(&self) -> Result<(), LinkError>;

    /// Disassociate and stop the interface.
    fn stop(&self) -> Result<(), LinkError>;
}

/// Source of the interface's current address.
pub trait AddressResolver: Send + Sync {
    /// Current assignment, or `None` if the interface has no usable address.
    fn current_address(&self) -> Option<AddressInfo>;
}

impl<T: StationLink + ?Sized> StationLink for Arc<T> {
    fn start(&self, profile: &ConnectionProfile) -> Result<(), LinkError> {
        (**self).start(profile)
    }

    fn associate(&self) -> Result<(), LinkError> {
        (**self).associate()
    }

    fn stop(&self) -> Result<(), LinkError> {
        (**self).stop()
    }
}

impl<T: AddressResolver + ?Sized> AddressResolver for Arc<T> {
    fn current_address(&self) -> Option<AddressInfo> {
        (**self).current_address()
    }
}

/// Link-layer errors.
#[derive(Debug)]
pub enum LinkError {
    /// The profile cannot be expressed in the driver's configuration.
    InvalidProfile(&'static str),
    /// The driver refused the request.
    Rejected(String),
    /// ESP-IDF error.
    #[cfg(feature = "esp32")]
    Esp(esp_idf_sys::EspError),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProfile(field) => write!(f, "invalid {} for driver", field),
            Self::Rejected(msg) => write!(f, "request rejected: {}", msg),
            #[cfg(feature = "esp32")]
            Self::Esp(e) => write!(f, "ESP error: {:?}", e),
        }
    }
}

impl std::error::Error for LinkError {}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for LinkError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Esp(e)
    }
}
