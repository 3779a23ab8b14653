//! Station-mode association.
//!
//! # Components
//!
//! - [`retry`] - bounded retry policy
//! - [`reason`] - disassociation reason codes
//! - [`event`] - link-layer notifications
//! - [`machine`] - the association state machine
//! - [`slot`] - one-shot outcome slot with blocking and async waits
//! - [`manager`] - thread-safe front end tying the above together
//!
//! Everything here is platform-independent. The ESP-IDF adapter lives in
//! [`crate::network`].

pub mod event;
pub mod machine;
pub mod manager;
pub mod reason;
pub mod retry;
pub mod slot;

pub use event::{parse_script, ParseEventError, StationEvent};
pub use machine::{BeginError, ConnectionState, Outcome, StationMachine};
pub use manager::{ConnectionManager, Handle, StationStats, StationStatus};
pub use reason::DisassociationReason;
pub use retry::{decide, RetryDecision};
pub use slot::{OutcomeSlot, WaitError};
