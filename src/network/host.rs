//! Host station.
//!
//! On host systems there is no radio. This station records the requests the
//! connection manager issues and answers address queries from a configurable
//! assignment, so the state machine can be driven by synthetic events.

use super::{AddressInfo, AddressResolver, LinkError, StationLink};
use crate::config::ConnectionProfile;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Scripted station for host runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedStation {
    address: Mutex<Option<AddressInfo>>,
    ssid: Mutex<Option<String>>,
    fail_start: AtomicBool,
    fail_associate: AtomicBool,
    start_calls: AtomicUsize,
    associate_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl ScriptedStation {
    /// Create a station with no address assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a station that resolves to `address` once asked.
    pub fn with_address(address: AddressInfo) -> Self {
        let station = Self::new();
        station.set_address(Some(address));
        station
    }

    /// Replace the address the resolver reports.
    pub fn set_address(&self, address: Option<AddressInfo>) {
        *self.address.lock().unwrap_or_else(PoisonError::into_inner) = address;
    }

    /// Make subsequent `start` calls fail.
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `associate` calls fail.
    pub fn fail_associate(&self, fail: bool) {
        self.fail_associate.store(fail, Ordering::Relaxed);
    }

    /// SSID of the last profile the interface was started with.
    pub fn ssid(&self) -> Option<String> {
        self.ssid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `start` calls so far.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::Relaxed)
    }

    /// Number of association requests so far.
    pub fn associate_calls(&self) -> usize {
        self.associate_calls.load(Ordering::Relaxed)
    }

    /// Number of `stop` calls so far.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::Relaxed)
    }
}

impl StationLink for ScriptedStation {
    fn start(&self, profile: &ConnectionProfile) -> Result<(), LinkError> {
        self.start_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_start.load(Ordering::Relaxed) {
            return Err(LinkError::Rejected("interface failed to start".into()));
        }
        *self.ssid.lock().unwrap_or_else(PoisonError::into_inner) = Some(profile.ssid().into());
        info!("Scripted station started for SSID {}", profile.ssid());
        Ok(())
    }

    fn associate(&self) -> Result<(), LinkError> {
        self.associate_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_associate.load(Ordering::Relaxed) {
            return Err(LinkError::Rejected("association request refused".into()));
        }
        debug!("Scripted station: association requested");
        Ok(())
    }

    fn stop(&self) -> Result<(), LinkError> {
        self.stop_calls.fetch_add(1, Ordering::Relaxed);
        debug!("Scripted station stopped");
        Ok(())
    }
}

impl AddressResolver for ScriptedStation {
    fn current_address(&self) -> Option<AddressInfo> {
        *self.address.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_records_calls() {
        let station = ScriptedStation::new();
        let profile = ConnectionProfile::open("Lab", 1).unwrap();
        station.start(&profile).unwrap();
        station.associate().unwrap();
        station.associate().unwrap();
        station.stop().unwrap();

        assert_eq!(station.start_calls(), 1);
        assert_eq!(station.associate_calls(), 2);
        assert_eq!(station.stop_calls(), 1);
        assert_eq!(station.ssid().as_deref(), Some("Lab"));
    }

    #[test]
    fn test_failures_are_reported() {
        let station = ScriptedStation::new();
        station.fail_start(true);
        station.fail_associate(true);
        let profile = ConnectionProfile::open("Lab", 1).unwrap();

        assert!(matches!(station.start(&profile), Err(LinkError::Rejected(_))));
        assert!(station.associate().is_err());
        assert_eq!(station.ssid(), None);
    }

    #[test]
    fn test_address_is_configurable() {
        let station = ScriptedStation::new();
        assert_eq!(station.current_address(), None);

        let info = AddressInfo::from_prefix(
            Ipv4Addr::new(192, 168, 1, 100),
            24,
            Ipv4Addr::new(192, 168, 1, 1),
        );
        station.set_address(Some(info));
        assert_eq!(station.current_address(), Some(info));
    }
}
