//! Human-readable and JSON network report.

use crate::wifi::{Outcome, WaitError};
use serde::Serialize;
use std::fmt;

/// Result of one connection cycle, as shown to an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkReport {
    /// SSID the station tried to join.
    pub ssid: String,
    /// Terminal outcome; `None` when the wait ended without one.
    pub outcome: Option<Outcome>,
    /// Why the wait ended without an outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_error: Option<String>,
}

impl NetworkReport {
    /// Build a report from the result of `await_outcome`.
    pub fn new(ssid: impl Into<String>, result: Result<Outcome, WaitError>) -> Self {
        let (outcome, wait_error) = match result {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            ssid: ssid.into(),
            outcome,
            wait_error,
        }
    }

    /// Returns true if the station ended up with an address.
    pub fn is_connected(&self) -> bool {
        self.outcome.as_ref().is_some_and(Outcome::is_connected)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for NetworkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== WiFi Information ===")?;
        match self.outcome {
            Some(Outcome::Connected {
                address,
                netmask,
                gateway,
            }) => {
                writeln!(f, "IP Address: {}", address)?;
                writeln!(f, "WiFi SSID: {}", self.ssid)?;
                writeln!(f, "Netmask: {}", netmask)?;
                writeln!(f, "Gateway: {}", gateway)?;
            }
            Some(Outcome::Failed { attempts_used }) => {
                writeln!(f, "WiFi Connection: Failed")?;
                writeln!(f, "SSID: {}", self.ssid)?;
                writeln!(f, "Retries used: {}", attempts_used)?;
            }
            None => {
                writeln!(f, "WiFi Connection: Failed")?;
                writeln!(f, "SSID: {}", self.ssid)?;
                if let Some(reason) = &self.wait_error {
                    writeln!(f, "Reason: {}", reason)?;
                }
            }
        }
        write!(f, "==============================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn connected() -> Outcome {
        Outcome::Connected {
            address: Ipv4Addr::new(192, 168, 1, 42),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
        }
    }

    #[test]
    fn test_connected_report() {
        let report = NetworkReport::new("HomeNet", Ok(connected()));
        let text = report.to_string();
        assert!(report.is_connected());
        assert!(text.contains("IP Address: 192.168.1.42"));
        assert!(text.contains("WiFi SSID: HomeNet"));
        assert!(text.contains("Netmask: 255.255.255.0"));
        assert!(text.contains("Gateway: 192.168.1.1"));
    }

    #[test]
    fn test_failed_report() {
        let report = NetworkReport::new("HomeNet", Ok(Outcome::Failed { attempts_used: 5 }));
        let text = report.to_string();
        assert!(!report.is_connected());
        assert!(text.contains("WiFi Connection: Failed"));
        assert!(text.contains("Retries used: 5"));
    }

    #[test]
    fn test_timed_out_report() {
        let report = NetworkReport::new("HomeNet", Err(WaitError::TimedOut));
        assert!(!report.is_connected());
        assert!(report.to_string().contains("Reason: timed out"));
    }

    #[test]
    fn test_report_json() {
        let json = NetworkReport::new("HomeNet", Ok(connected()))
            .to_json()
            .unwrap();
        assert!(json.contains(r#""ssid":"HomeNet""#));
        assert!(json.contains(r#""address":"192.168.1.42""#));
        assert!(!json.contains("wait_error"));

        let json = NetworkReport::new("HomeNet", Err(WaitError::Closed))
            .to_json()
            .unwrap();
        assert!(json.contains(r#""outcome":null"#));
        assert!(json.contains(r#""wait_error":"station disconnected""#));
    }
}
