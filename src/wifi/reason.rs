//! Disassociation reason codes.
//!
//! Values follow ESP-IDF's `wifi_err_reason_t`, which carries the IEEE 802.11
//! reason codes below 200 and Espressif's own codes from 200 upwards. They are
//! only reported for diagnostics; the retry policy never looks at them.

use std::fmt;

/// Why the access point (or the station) dropped the association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisassociationReason {
    Unspecified,
    AuthExpire,
    AuthLeave,
    AssocExpire,
    AssocTooMany,
    NotAuthed,
    NotAssoced,
    AssocLeave,
    AssocNotAuthed,
    DisassocPwrcapBad,
    DisassocSupchanBad,
    IeInvalid,
    MicFailure,
    FourWayHandshakeTimeout,
    GroupKeyUpdateTimeout,
    IeIn4WayDiffers,
    GroupCipherInvalid,
    PairwiseCipherInvalid,
    AkmpInvalid,
    UnsuppRsnIeVersion,
    InvalidRsnIeCap,
    Ieee8021xAuthFailed,
    CipherSuiteRejected,
    BeaconTimeout,
    NoApFound,
    AuthFail,
    AssocFail,
    HandshakeTimeout,
    ConnectionFail,
    /// A code this crate has no name for.
    Other(u16),
}

impl DisassociationReason {
    /// Numeric code as reported by the driver.
    pub fn code(self) -> u16 {
        match self {
            Self::Unspecified => 1,
            Self::AuthExpire => 2,
            Self::AuthLeave => 3,
            Self::AssocExpire => 4,
            Self::AssocTooMany => 5,
            Self::NotAuthed => 6,
            Self::NotAssoced => 7,
            Self::AssocLeave => 8,
            Self::AssocNotAuthed => 9,
            Self::DisassocPwrcapBad => 10,
            Self::DisassocSupchanBad => 11,
            Self::IeInvalid => 13,
            Self::MicFailure => 14,
            Self::FourWayHandshakeTimeout => 15,
            Self::GroupKeyUpdateTimeout => 16,
            Self::IeIn4WayDiffers => 17,
            Self::GroupCipherInvalid => 18,
            Self::PairwiseCipherInvalid => 19,
            Self::AkmpInvalid => 20,
            Self::UnsuppRsnIeVersion => 21,
            Self::InvalidRsnIeCap => 22,
            Self::Ieee8021xAuthFailed => 23,
            Self::CipherSuiteRejected => 24,
            Self::BeaconTimeout => 200,
            Self::NoApFound => 201,
            Self::AuthFail => 202,
            Self::AssocFail => 203,
            Self::HandshakeTimeout => 204,
            Self::ConnectionFail => 205,
            Self::Other(code) => code,
        }
    }

    /// Human-readable description for logs.
    pub fn description(self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified reason",
            Self::AuthExpire => "Authentication expired",
            Self::AuthLeave => "Authentication left",
            Self::AssocExpire => "Association expired",
            Self::AssocTooMany => "Too many associations",
            Self::NotAuthed => "Not authenticated",
            Self::NotAssoced => "Not associated",
            Self::AssocLeave => "Association left",
            Self::AssocNotAuthed => "Association not authenticated",
            Self::DisassocPwrcapBad => "Disassociation due to power capability",
            Self::DisassocSupchanBad => "Disassociation due to supported channels",
            Self::IeInvalid => "Invalid information element",
            Self::MicFailure => "MIC failure",
            Self::FourWayHandshakeTimeout => "4-way handshake timeout",
            Self::GroupKeyUpdateTimeout => "Group key update timeout",
            Self::IeIn4WayDiffers => "Information element in 4-way handshake differs",
            Self::GroupCipherInvalid => "Group cipher invalid",
            Self::PairwiseCipherInvalid => "Pairwise cipher invalid",
            Self::AkmpInvalid => "AKMP invalid",
            Self::UnsuppRsnIeVersion => "Unsupported RSN IE version",
            Self::InvalidRsnIeCap => "Invalid RSN IE capabilities",
            Self::Ieee8021xAuthFailed => "802.1X authentication failed",
            Self::CipherSuiteRejected => "Cipher suite rejected",
            Self::BeaconTimeout => "Beacon timeout",
            Self::NoApFound => "No access point found",
            Self::AuthFail => "Authentication failed",
            Self::AssocFail => "Association failed",
            Self::HandshakeTimeout => "Handshake timeout",
            Self::ConnectionFail => "Connection failed",
            Self::Other(_) => "Unknown reason",
        }
    }
}

impl From<u16> for DisassociationReason {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::Unspecified,
            2 => Self::AuthExpire,
            3 => Self::AuthLeave,
            4 => Self::AssocExpire,
            5 => Self::AssocTooMany,
            6 => Self::NotAuthed,
            7 => Self::NotAssoced,
            8 => Self::AssocLeave,
            9 => Self::AssocNotAuthed,
            10 => Self::DisassocPwrcapBad,
            11 => Self::DisassocSupchanBad,
            13 => Self::IeInvalid,
            14 => Self::MicFailure,
            15 => Self::FourWayHandshakeTimeout,
            16 => Self::GroupKeyUpdateTimeout,
            17 => Self::IeIn4WayDiffers,
            18 => Self::GroupCipherInvalid,
            19 => Self::PairwiseCipherInvalid,
            20 => Self::AkmpInvalid,
            21 => Self::UnsuppRsnIeVersion,
            22 => Self::InvalidRsnIeCap,
            23 => Self::Ieee8021xAuthFailed,
            24 => Self::CipherSuiteRejected,
            200 => Self::BeaconTimeout,
            201 => Self::NoApFound,
            202 => Self::AuthFail,
            203 => Self::AssocFail,
            204 => Self::HandshakeTimeout,
            205 => Self::ConnectionFail,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for DisassociationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.description())
    }
}
