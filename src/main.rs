//! ESP32 station firmware.
//!
//! Joins the network named at compile time and prints the result:
//!
//! ```text
//! WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" WIFI_MAX_RETRY=5 \
//!     cargo espflash flash --monitor --features esp32 --release
//! ```

#[cfg(feature = "esp32")]
const WIFI_SSID: Option<&str> = option_env!("WIFI_SSID");

/// Empty or unset for open networks.
#[cfg(feature = "esp32")]
const WIFI_PASSWORD: Option<&str> = option_env!("WIFI_PASSWORD");

#[cfg(feature = "esp32")]
const WIFI_MAX_RETRY: Option<&str> = option_env!("WIFI_MAX_RETRY");

#[cfg(feature = "esp32")]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use esp32_station::config::{
        ConnectionProfile, CONNECTION_TIMEOUT_SECS, ENV_MAX_RETRY, ENV_PASSWORD, ENV_SSID,
    };
    use esp32_station::network::{subscribe_events, EspStation};
    use esp32_station::{ConnectionManager, NetworkReport};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{info, warn};
    use std::sync::Arc;
    use std::time::Duration;

    let profile = ConnectionProfile::from_lookup(|key| {
        let value = match key {
            ENV_SSID => WIFI_SSID,
            ENV_PASSWORD => WIFI_PASSWORD,
            ENV_MAX_RETRY => WIFI_MAX_RETRY,
            _ => None,
        };
        value.filter(|v| !v.is_empty()).map(str::to_string)
    })?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    // Taking the partition runs the one-time NVS init (erasing on version mismatch)
    let nvs = EspDefaultNvsPartition::take()?;

    let station = Arc::new(EspStation::new(peripherals.modem, sysloop.clone(), Some(nvs))?);
    let manager = Arc::new(ConnectionManager::new(station.clone(), station));
    let _bridge = subscribe_events(&sysloop, manager.clone())?;

    let handle = manager.begin(profile.clone())?;
    let result = manager.await_outcome(handle, Duration::from_secs(CONNECTION_TIMEOUT_SECS));

    let report = NetworkReport::new(profile.ssid(), result);
    println!("\n{}", report);

    if report.is_connected() {
        info!("Station connected, entering idle loop");
    } else {
        warn!("Station not connected, entering idle loop");
    }

    loop {
        std::thread::sleep(Duration::from_secs(10));
        log::debug!("Station state: {}", manager.state());
    }
}

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!("=== ESP32 station starting ===");

    if let Err(e) = run() {
        log::error!("Station failed: {}", e);
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo run --bin host-station' to drive the state machine on the host.");
}
