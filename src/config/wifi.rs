//! Connection profile for station mode.
//!
//! This module contains platform-independent types describing the network
//! a station should join, and how many times it may retry before giving up.
//!
//! # Example
//!
//! ```
//! use esp32_station::config::ConnectionProfile;
//!
//! let profile = ConnectionProfile::new("MyNetwork", "MyPassword", 3).unwrap();
//! assert_eq!(profile.max_retry(), 3);
//! assert!(!profile.is_open());
//! ```

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Retry budget used when none is configured.
pub const DEFAULT_MAX_RETRY: u8 = 5;

/// Default time a caller waits for a terminal outcome, in seconds.
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the SSID.
pub const ENV_SSID: &str = "WIFI_SSID";

/// Environment variable holding the password (empty or unset for open networks).
pub const ENV_PASSWORD: &str = "WIFI_PASSWORD";

/// Environment variable holding the retry budget.
pub const ENV_MAX_RETRY: &str = "WIFI_MAX_RETRY";

/// What a station needs to join one access point.
///
/// The password is wiped from memory when the profile is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ConnectionProfile {
    ssid: String,
    password: String,
    max_retry: u8,
}

impl ConnectionProfile {
    /// Create a new profile.
    ///
    /// Returns an error if SSID or password are invalid.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        max_retry: u8,
    ) -> Result<Self, ConfigError> {
        let profile = Self {
            ssid: ssid.into(),
            password: password.into(),
            max_retry,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Create a profile for an open network (no password).
    pub fn open(ssid: impl Into<String>, max_retry: u8) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new(), max_retry)
    }

    /// Build a profile from `WIFI_SSID`, `WIFI_PASSWORD` and `WIFI_MAX_RETRY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a profile from an arbitrary key lookup.
    ///
    /// A missing password means an open network; a missing retry budget
    /// falls back to [`DEFAULT_MAX_RETRY`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ssid = lookup(ENV_SSID).ok_or(ConfigError::Missing(ENV_SSID))?;
        let password = lookup(ENV_PASSWORD).unwrap_or_default();
        let max_retry = match lookup(ENV_MAX_RETRY) {
            Some(raw) => parse_max_retry(&raw)?,
            None => DEFAULT_MAX_RETRY,
        };
        Self::new(ssid, password, max_retry)
    }

    /// Validate the profile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        // Empty is OK for open networks
        if !self.password.is_empty() && self.password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(())
    }

    /// Network SSID.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Network password (empty for open networks).
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Number of reassociation retries allowed before giving up.
    pub fn max_retry(&self) -> u8 {
        self.max_retry
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// Never print the password.
impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("ssid", &self.ssid)
            .field("password", &if self.is_open() { "" } else { "****" })
            .field("max_retry", &self.max_retry)
            .finish()
    }
}

fn parse_max_retry(raw: &str) -> Result<u8, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidMaxRetry(raw.to_string()))
}

/// Errors that can occur while building a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Retry budget is not a number in 0..=255.
    InvalidMaxRetry(String),
    /// A required setting was not provided.
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::InvalidMaxRetry(raw) => write!(f, "invalid retry budget: {:?}", raw),
            Self::Missing(key) => write!(f, "{} is not set", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_valid_profile() {
        let profile = ConnectionProfile::new("TestNetwork", "password123", 3).unwrap();
        assert_eq!(profile.ssid(), "TestNetwork");
        assert_eq!(profile.password(), "password123");
        assert_eq!(profile.max_retry(), 3);
    }

    #[test]
    fn test_open_network() {
        let profile = ConnectionProfile::open("OpenNetwork", 0).unwrap();
        assert!(profile.is_open());
        assert_eq!(profile.max_retry(), 0);
    }

    #[test]
    fn test_empty_ssid() {
        let result = ConnectionProfile::new("", "password123", 1);
        assert_eq!(result, Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_bounds() {
        assert!(ConnectionProfile::new("a".repeat(32), "password123", 1).is_ok());
        let result = ConnectionProfile::new("a".repeat(33), "password123", 1);
        assert!(matches!(result, Err(ConfigError::SsidTooLong { len: 33, .. })));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(ConnectionProfile::new("Net", "12345678", 1).is_ok());
        assert!(ConnectionProfile::new("Net", "a".repeat(64), 1).is_ok());
        assert!(matches!(
            ConnectionProfile::new("Net", "short", 1),
            Err(ConfigError::PasswordTooShort { .. })
        ));
        assert!(matches!(
            ConnectionProfile::new("Net", "a".repeat(65), 1),
            Err(ConfigError::PasswordTooLong { .. })
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let profile = ConnectionProfile::new("Net", "supersecret", 1).unwrap();
        let debug_str = format!("{:?}", profile);
        assert!(debug_str.contains("Net"));
        assert!(!debug_str.contains("supersecret"));
    }

    #[test]
    fn test_from_lookup_full() {
        let profile = ConnectionProfile::from_lookup(lookup_from(&[
            (ENV_SSID, "HomeNet"),
            (ENV_PASSWORD, "password123"),
            (ENV_MAX_RETRY, " 7 "),
        ]))
        .unwrap();
        assert_eq!(profile.ssid(), "HomeNet");
        assert_eq!(profile.max_retry(), 7);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let profile = ConnectionProfile::from_lookup(lookup_from(&[(ENV_SSID, "Cafe")])).unwrap();
        assert!(profile.is_open());
        assert_eq!(profile.max_retry(), DEFAULT_MAX_RETRY);
    }

    #[test]
    fn test_from_lookup_missing_ssid() {
        let result = ConnectionProfile::from_lookup(lookup_from(&[]));
        assert_eq!(result, Err(ConfigError::Missing(ENV_SSID)));
    }

    #[test]
    fn test_from_lookup_bad_retry() {
        let result = ConnectionProfile::from_lookup(lookup_from(&[
            (ENV_SSID, "Net"),
            (ENV_MAX_RETRY, "300"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidMaxRetry(_))));
    }
}
