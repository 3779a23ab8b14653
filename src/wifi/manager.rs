//! Connection manager.
//!
//! Owns one [`StationMachine`] behind a mutex and publishes terminal outcomes
//! through an [`OutcomeSlot`]. The platform adapter calls
//! [`ConnectionManager::handle_event`] from the event loop; callers use
//! [`begin`](ConnectionManager::begin) and
//! [`await_outcome`](ConnectionManager::await_outcome).
//!
//! # Lock Ordering
//!
//! 1. `machine` - state, counter and profile
//! 2. `slot` - published outcome (completed while `machine` is held)
//!
//! Waiters only take the slot lock, so a blocked caller never holds up a
//! transition.
//!
//! # Example
//!
//! ```
//! use std::net::Ipv4Addr;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use esp32_station::config::ConnectionProfile;
//! use esp32_station::network::{AddressInfo, ScriptedStation};
//! use esp32_station::wifi::{ConnectionManager, StationEvent};
//!
//! let station = Arc::new(ScriptedStation::with_address(AddressInfo::from_prefix(
//!     Ipv4Addr::new(10, 0, 0, 5),
//!     24,
//!     Ipv4Addr::new(10, 0, 0, 1),
//! )));
//! let manager = ConnectionManager::new(station.clone(), station);
//!
//! let profile = ConnectionProfile::new("Lab", "password123", 3).unwrap();
//! let handle = manager.begin(profile).unwrap();
//! manager.handle_event(StationEvent::InterfaceStarted);
//! manager.handle_event(StationEvent::AddressAcquired);
//!
//! let outcome = manager.await_outcome(handle, Duration::from_secs(1)).unwrap();
//! assert!(outcome.is_connected());
//! assert!(manager.is_connected());
//! ```

use super::event::StationEvent;
use super::machine::{BeginError, ConnectionState, Outcome, StationMachine};
use super::slot::{OutcomeSlot, WaitError};
use crate::config::ConnectionProfile;
use crate::network::{AddressResolver, LinkError, StationLink, StatusSource};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Identifies one `begin` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    generation: u64,
}

impl Handle {
    /// Cycle number, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Counters since the manager was created.
#[derive(Debug, Default)]
pub struct StationStats {
    /// Accepted `begin` calls.
    pub cycles: AtomicUsize,
    /// Association requests sent to the link, refused ones included.
    pub association_requests: AtomicUsize,
    /// Disassociation notifications received (including ignored ones).
    pub disassociations: AtomicUsize,
    /// Cycles that ended connected.
    pub connected: AtomicUsize,
    /// Cycles that ended failed.
    pub failed: AtomicUsize,
}

impl StationStats {
    fn record_outcome(&self, outcome: &Outcome) {
        let counter = if outcome.is_connected() {
            &self.connected
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Link view handed to the machine; counts association requests.
struct CountingLink<'a, L> {
    link: &'a L,
    requests: &'a AtomicUsize,
}

impl<L: StationLink> StationLink for CountingLink<'_, L> {
    fn start(&self, profile: &ConnectionProfile) -> Result<(), LinkError> {
        self.link.start(profile)
    }

    fn associate(&self) -> Result<(), LinkError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.link.associate()
    }

    fn stop(&self) -> Result<(), LinkError> {
        self.link.stop()
    }
}

/// Point-in-time view of a manager, served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStatus {
    pub state: ConnectionState,
    pub ssid: Option<String>,
    pub attempts: u8,
    pub max_retry: u8,
    pub outcome: Option<Outcome>,
    pub cycles: usize,
    pub association_requests: usize,
    pub disassociations: usize,
    pub connected: usize,
    pub failed: usize,
}

/// Drives one station interface through association cycles.
pub struct ConnectionManager<L, R> {
    link: L,
    resolver: R,
    machine: Mutex<StationMachine>,
    slot: OutcomeSlot<Outcome>,
    stats: StationStats,
}

impl<L: StationLink, R: AddressResolver> ConnectionManager<L, R> {
    /// Create an idle manager.
    pub fn new(link: L, resolver: R) -> Self {
        Self {
            link,
            resolver,
            machine: Mutex::new(StationMachine::new()),
            slot: OutcomeSlot::new(),
            stats: StationStats::default(),
        }
    }

    /// Start a connection cycle and return immediately.
    ///
    /// Rejected with [`BeginError::InProgress`] while a cycle is associating.
    /// A terminal or idle manager accepts a new cycle, which supersedes the
    /// previous handle.
    pub fn begin(&self, profile: ConnectionProfile) -> Result<Handle, BeginError> {
        let mut machine = self.lock_machine();
        machine.begin(profile, &self.counting_link())?;
        let generation = self.slot.arm();
        self.stats.cycles.fetch_add(1, Ordering::Relaxed);
        debug!("Connection cycle {} started", generation);
        Ok(Handle { generation })
    }

    /// Feed one link-layer notification into the state machine.
    ///
    /// This is the entry point for event source adapters.
    pub fn handle_event(&self, event: StationEvent) {
        let mut machine = self.lock_machine();
        if let StationEvent::Disassociated(_) = event {
            self.stats.disassociations.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(outcome) = machine.apply_event(event, &self.counting_link(), &self.resolver) {
            self.stats.record_outcome(&outcome);
            if !self.slot.complete(outcome) {
                warn!("Outcome {:?} produced with no cycle waiting", outcome);
            }
        }
    }

    /// Block until `handle`'s cycle ends or `timeout` elapses.
    ///
    /// A timeout does not stop the cycle; a later call can still observe the
    /// outcome.
    pub fn await_outcome(&self, handle: Handle, timeout: Duration) -> Result<Outcome, WaitError> {
        self.slot.wait(handle.generation, timeout)
    }

    /// Async variant of [`await_outcome`](Self::await_outcome).
    pub async fn await_outcome_async(
        &self,
        handle: Handle,
        timeout: Duration,
    ) -> Result<Outcome, WaitError> {
        self.slot.wait_async(handle.generation, timeout).await
    }

    /// Non-blocking check that the station currently holds an address.
    pub fn is_connected(&self) -> bool {
        self.lock_machine().state() == ConnectionState::AddressAcquired
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.lock_machine().state()
    }

    /// Tear the station down and return to idle.
    ///
    /// Pending waiters wake with [`WaitError::Closed`]. The machine is reset
    /// even if the link reports an error while stopping.
    pub fn disconnect(&self) -> Result<(), LinkError> {
        let mut machine = self.lock_machine();
        if machine.profile().is_none() {
            debug!("Disconnect requested while idle");
            self.slot.close();
            return Ok(());
        }

        info!("Disconnecting from WiFi");
        let result = self.link.stop();
        machine.reset();
        self.slot.close();
        result
    }

    /// Snapshot of state and counters.
    pub fn status(&self) -> StationStatus {
        let machine = self.lock_machine();
        StationStatus {
            state: machine.state(),
            ssid: machine.profile().map(|p| p.ssid().to_string()),
            attempts: machine.attempts(),
            max_retry: machine.max_retry(),
            outcome: self.slot.peek(self.slot.generation()),
            cycles: self.stats.cycles.load(Ordering::Relaxed),
            association_requests: self.stats.association_requests.load(Ordering::Relaxed),
            disassociations: self.stats.disassociations.load(Ordering::Relaxed),
            connected: self.stats.connected.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    fn counting_link(&self) -> CountingLink<'_, L> {
        CountingLink {
            link: &self.link,
            requests: &self.stats.association_requests,
        }
    }

    fn lock_machine(&self) -> MutexGuard<'_, StationMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: StationLink, R: AddressResolver> StatusSource for ConnectionManager<L, R> {
    fn status_json(&self) -> String {
        serde_json::to_string(&self.status()).unwrap_or_else(|e| {
            warn!("Failed to serialize station status: {}", e);
            "{}".to_string()
        })
    }
}
