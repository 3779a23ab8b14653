//! Link-layer notifications consumed by the state machine.

use super::reason::DisassociationReason;
use std::fmt;
use std::str::FromStr;

/// Notification delivered by the station's event source.
///
/// Sources may repeat or reorder these; the state machine tolerates both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    /// The station interface came up and is ready for a connect request.
    InterfaceStarted,
    /// Link-layer association completed (no address yet).
    Associated,
    /// The association was dropped.
    Disassociated(DisassociationReason),
    /// DHCP assigned an address; query the resolver for it.
    AddressAcquired,
}

impl fmt::Display for StationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterfaceStarted => write!(f, "started"),
            Self::Associated => write!(f, "associated"),
            Self::Disassociated(reason) => write!(f, "disassociated:{}", reason.code()),
            Self::AddressAcquired => write!(f, "got-ip"),
        }
    }
}

/// Error returned when an event script entry cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEventError(pub String);

impl fmt::Display for ParseEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown station event: {}", self.0)
    }
}

impl std::error::Error for ParseEventError {}

/// Parses the textual form used by event scripts:
/// `started`, `associated`, `disassociated[:code]`, `got-ip`.
impl FromStr for StationEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "started" => return Ok(Self::InterfaceStarted),
            "associated" => return Ok(Self::Associated),
            "got-ip" => return Ok(Self::AddressAcquired),
            "disassociated" => {
                return Ok(Self::Disassociated(DisassociationReason::Unspecified))
            }
            _ => {}
        }

        let code = s
            .strip_prefix("disassociated:")
            .and_then(|code| code.parse::<u16>().ok());
        match code {
            Some(code) => Ok(Self::Disassociated(code.into())),
            None => Err(ParseEventError(s)),
        }
    }
}

/// Parse a comma-separated event script.
pub fn parse_script(script: &str) -> Result<Vec<StationEvent>, ParseEventError> {
    script
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(str::parse)
        .collect()
}
