//! Station association state machine.
//!
//! ```text
//! Idle | Failed | AddressAcquired --begin--> Associating
//! Associating --started--> Associating (connect request)
//! Associating --associated--> Associated
//! Associating | Associated --disassociated--> Associating (retry) | Failed
//! Associating | Associated --got-ip--> AddressAcquired | Failed (no address)
//! AddressAcquired --disassociated--> Idle (no reassociation)
//! ```
//!
//! The machine owns the attempt counter and a copy of the active profile. It
//! talks to the link and the resolver directly from inside a transition, so a
//! caller only has to serialize calls to [`StationMachine::apply_event`].

use super::event::StationEvent;
use super::retry::{decide, RetryDecision};
use crate::config::ConnectionProfile;
use crate::network::{AddressInfo, AddressResolver, LinkError, StationLink};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// Connection state of a station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection cycle running.
    Idle,
    /// Association requested, waiting for the access point.
    Associating,
    /// Associated at link level, waiting for DHCP.
    Associated,
    /// Address assigned; terminal until the next `begin`.
    ///
    /// Losing the link drops the state to [`Idle`](Self::Idle) without a
    /// reassociation attempt; the cycle's `Connected` outcome is kept.
    AddressAcquired,
    /// Retry budget exhausted or address lookup failed; terminal.
    Failed,
}

impl ConnectionState {
    /// A `begin` cycle is running and has not reached a terminal state.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Associating | Self::Associated)
    }

    /// No further automatic transitions happen from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AddressAcquired | Self::Failed)
    }

    /// Lowercase name used in logs and status output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Associating => "associating",
            Self::Associated => "associated",
            Self::AddressAcquired => "address_acquired",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one `begin` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The station joined the network and holds an address.
    Connected {
        address: Ipv4Addr,
        netmask: Ipv4Addr,
        gateway: Ipv4Addr,
    },
    /// The station gave up after `attempts_used` retries.
    Failed { attempts_used: u8 },
}

impl Outcome {
    /// Returns true for [`Outcome::Connected`].
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

impl From<AddressInfo> for Outcome {
    fn from(info: AddressInfo) -> Self {
        Self::Connected {
            address: info.address,
            netmask: info.netmask,
            gateway: info.gateway,
        }
    }
}

/// Errors returned by [`StationMachine::begin`].
#[derive(Debug)]
pub enum BeginError {
    /// A cycle is already associating; it must finish or be disconnected first.
    InProgress,
    /// The interface could not be brought up.
    Init(LinkError),
}

impl fmt::Display for BeginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "a connection attempt is already in progress"),
            Self::Init(e) => write!(f, "station initialization failed: {}", e),
        }
    }
}

impl std::error::Error for BeginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Init(e) => Some(e),
            Self::InProgress => None,
        }
    }
}

/// The association state machine.
#[derive(Debug)]
pub struct StationMachine {
    state: ConnectionState,
    attempts: u8,
    profile: Option<ConnectionProfile>,
}

impl Default for StationMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StationMachine {
    /// Create an idle machine.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            attempts: 0,
            profile: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Retries issued since the last `begin` or address acquisition.
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Retry budget of the active profile (0 when idle).
    pub fn max_retry(&self) -> u8 {
        self.profile.as_ref().map_or(0, ConnectionProfile::max_retry)
    }

    /// Profile of the current or last cycle.
    pub fn profile(&self) -> Option<&ConnectionProfile> {
        self.profile.as_ref()
    }

    /// Start a new cycle for `profile`.
    ///
    /// Rejected while a cycle is in flight. On a link failure the machine is
    /// left idle.
    pub fn begin(
        &mut self,
        profile: ConnectionProfile,
        link: &dyn StationLink,
    ) -> Result<(), BeginError> {
        if self.state.is_in_flight() {
            return Err(BeginError::InProgress);
        }

        self.attempts = 0;
        if let Err(e) = link.start(&profile) {
            self.state = ConnectionState::Idle;
            self.profile = None;
            return Err(BeginError::Init(e));
        }

        info!(
            "Connecting to WiFi: {} (max {} retries)",
            profile.ssid(),
            profile.max_retry()
        );
        self.profile = Some(profile);
        self.state = ConnectionState::Associating;
        Ok(())
    }

    /// Apply one link-layer notification.
    ///
    /// Returns the outcome when this event ends the cycle. Events that make no
    /// sense in the current state are ignored.
    pub fn apply_event(
        &mut self,
        event: StationEvent,
        link: &dyn StationLink,
        resolver: &dyn AddressResolver,
    ) -> Option<Outcome> {
        match (self.state, event) {
            (ConnectionState::Associating, StationEvent::InterfaceStarted) => {
                self.request_association(link)
            }
            (ConnectionState::Associating, StationEvent::Associated) => {
                debug!("Associated, waiting for address");
                self.state = ConnectionState::Associated;
                None
            }
            (
                ConnectionState::Associating | ConnectionState::Associated,
                StationEvent::Disassociated(reason),
            ) => {
                warn!("WiFi disconnected. Reason: {}", reason);
                self.retry_or_give_up(link)
            }
            (
                ConnectionState::Associating | ConnectionState::Associated,
                StationEvent::AddressAcquired,
            ) => self.resolve_address(resolver),
            (ConnectionState::AddressAcquired, StationEvent::Disassociated(reason)) => {
                // Terminal: report the loss but do not reassociate.
                warn!("WiFi link lost after address acquisition. Reason: {}", reason);
                self.state = ConnectionState::Idle;
                None
            }
            (state, event) => {
                debug!("Ignoring {} while {}", event, state);
                None
            }
        }
    }

    /// Return to idle, forgetting the active profile.
    pub fn reset(&mut self) {
        self.state = ConnectionState::Idle;
        self.attempts = 0;
        self.profile = None;
    }

    fn request_association(&mut self, link: &dyn StationLink) -> Option<Outcome> {
        match link.associate() {
            Ok(()) => None,
            Err(e) => {
                warn!("Association request failed: {}", e);
                self.retry_or_give_up(link)
            }
        }
    }

    /// Count a failed attempt. A refused reassociation request counts as
    /// another failure, so this loops until a request is accepted or the
    /// budget runs out.
    fn retry_or_give_up(&mut self, link: &dyn StationLink) -> Option<Outcome> {
        let max_retry = self.max_retry();
        loop {
            match decide(self.attempts, max_retry) {
                RetryDecision::GiveUp => {
                    warn!(
                        "Connection to the access point failed (attempt {}/{})",
                        self.attempts, max_retry
                    );
                    self.state = ConnectionState::Failed;
                    return Some(Outcome::Failed {
                        attempts_used: self.attempts,
                    });
                }
                RetryDecision::Retry => {
                    self.attempts += 1;
                    self.state = ConnectionState::Associating;
                    info!(
                        "Retry to connect to the access point (attempt {}/{})",
                        self.attempts, max_retry
                    );
                    match link.associate() {
                        Ok(()) => return None,
                        Err(e) => warn!("Association request failed: {}", e),
                    }
                }
            }
        }
    }

    fn resolve_address(&mut self, resolver: &dyn AddressResolver) -> Option<Outcome> {
        let attempts_used = self.attempts;
        self.attempts = 0;

        match resolver.current_address() {
            Some(info) => {
                info!("Connected to WiFi, IP: {}", info.address);
                self.state = ConnectionState::AddressAcquired;
                Some(info.into())
            }
            None => {
                warn!("Address acquired but interface reports no address");
                self.state = ConnectionState::Failed;
                Some(Outcome::Failed { attempts_used })
            }
        }
    }
}
