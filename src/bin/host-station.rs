//! Host station simulator.
//!
//! Drives the connection manager with a scripted event source instead of a
//! radio, then prints the network report.
//!
//! # Usage
//!
//! ```bash
//! WIFI_SSID=Lab WIFI_MAX_RETRY=3 \
//! STATION_SCRIPT="started,disassociated:201,associated,got-ip" \
//!     cargo run --bin host-station -- [--json] [--serve]
//! ```
//!
//! - `STATION_SCRIPT` - comma-separated events (`started`, `associated`,
//!   `disassociated[:code]`, `got-ip`)
//! - `STATION_ADDRESS` - address the resolver reports, `ip/prefix@gateway`;
//!   `none` simulates an interface that lost its address
//! - `STATION_EVENT_DELAY_MS` - delay between scripted events
//! - `--json` prints the report as JSON
//! - `--serve` keeps the status endpoint up until Ctrl+C

use esp32_station::config::{ConnectionProfile, CONNECTION_TIMEOUT_SECS, DEFAULT_MAX_RETRY};
use esp32_station::network::{StatusServer, DEFAULT_STATUS_PORT};
use esp32_station::wifi::parse_script;
use esp32_station::{AddressInfo, ConnectionManager, NetworkReport, ScriptedStation};
use log::{error, info, warn};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_SCRIPT: &str = "started,disassociated:201,associated,got-ip";
const DEFAULT_ADDRESS: &str = "10.0.0.5/24@10.0.0.1";
const DEFAULT_EVENT_DELAY_MS: u64 = 200;

/// Parse `ip/prefix@gateway`.
fn parse_address(raw: &str) -> Option<AddressInfo> {
    let (cidr, gateway) = raw.trim().split_once('@')?;
    let (ip, prefix) = cidr.split_once('/')?;
    Some(AddressInfo::from_prefix(
        ip.parse::<Ipv4Addr>().ok()?,
        prefix.parse().ok()?,
        gateway.parse().ok()?,
    ))
}

/// Parse the event delay; unset falls back to the default.
fn parse_delay(raw: Option<&str>) -> Option<Duration> {
    match raw {
        None => Some(Duration::from_millis(DEFAULT_EVENT_DELAY_MS)),
        Some(raw) => raw.trim().parse().ok().map(Duration::from_millis),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let serve = args.iter().any(|a| a == "--serve");

    info!("=== Host station starting ===");

    let profile = match ConnectionProfile::from_env() {
        Ok(profile) => profile,
        Err(e) => {
            warn!("{}; using simulated open network", e);
            match ConnectionProfile::open("SimulatedNetwork", DEFAULT_MAX_RETRY) {
                Ok(profile) => profile,
                Err(e) => {
                    error!("Invalid fallback profile: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let script = match parse_script(&env_or("STATION_SCRIPT", DEFAULT_SCRIPT)) {
        Ok(script) => script,
        Err(e) => {
            error!("Invalid STATION_SCRIPT: {}", e);
            std::process::exit(1);
        }
    };

    let raw_address = env_or("STATION_ADDRESS", DEFAULT_ADDRESS);
    let station = Arc::new(ScriptedStation::new());
    if raw_address.trim() != "none" {
        match parse_address(&raw_address) {
            Some(address) => station.set_address(Some(address)),
            None => {
                error!("Invalid STATION_ADDRESS: {}", raw_address);
                std::process::exit(1);
            }
        }
    }

    let delay = match parse_delay(std::env::var("STATION_EVENT_DELAY_MS").ok().as_deref()) {
        Some(delay) => delay,
        None => {
            error!("Invalid STATION_EVENT_DELAY_MS: expected milliseconds");
            std::process::exit(1);
        }
    };

    let manager = Arc::new(ConnectionManager::new(station.clone(), station.clone()));

    let _status_server = if serve {
        match StatusServer::start(None, DEFAULT_STATUS_PORT, manager.clone()) {
            Ok(server) => Some(server),
            Err(e) => {
                warn!("Failed to start status server: {}", e);
                None
            }
        }
    } else {
        None
    };

    let handle = match manager.begin(profile.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to begin connection: {}", e);
            std::process::exit(1);
        }
    };

    // Scripted event source
    let cancel = CancellationToken::new();
    let source = {
        let manager = manager.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            for event in script {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                info!("Event: {}", event);
                manager.handle_event(event);
            }
        })
    };

    let result = manager
        .await_outcome_async(handle, Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .await;
    cancel.cancel();
    let _ = source.await;

    let report = NetworkReport::new(profile.ssid(), result);
    if json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize report: {}", e),
        }
    } else {
        println!("\n{}", report);
    }

    if serve {
        info!("Serving status until Ctrl+C");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for Ctrl+C: {}", e);
        }
    }

    if let Err(e) = manager.disconnect() {
        warn!("Disconnect failed: {}", e);
    }

    if !report.is_connected() {
        std::process::exit(2);
    }
}
