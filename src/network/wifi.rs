//! ESP32 station adapter.
//!
//! Wraps the ESP-IDF WiFi driver as a [`StationLink`] and [`AddressResolver`],
//! and bridges the system event loop into a [`ConnectionManager`].
//!
//! The driver is used in its non-blocking form (`EspWifi`, not
//! `BlockingWifi`): `start` and `connect` only post requests, and progress is
//! reported through `WifiEvent`/`IpEvent` notifications.

use super::{prefix_to_netmask, AddressInfo, AddressResolver, LinkError, StationLink};
use crate::config::ConnectionProfile;
use crate::wifi::{ConnectionManager, StationEvent};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};
use esp_idf_sys::EspError;
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// ESP-IDF station interface.
pub struct EspStation {
    wifi: Mutex<EspWifi<'static>>,
}

impl EspStation {
    /// Create the WiFi driver in station mode.
    ///
    /// Pass the default NVS partition so the driver can keep its calibration
    /// data; the application must have taken it (which initializes NVS) first.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, LinkError> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi: Mutex::new(wifi),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EspWifi<'static>> {
        self.wifi.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StationLink for EspStation {
    fn start(&self, profile: &ConnectionProfile) -> Result<(), LinkError> {
        let auth_method = if profile.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let config = Configuration::Client(ClientConfiguration {
            ssid: profile
                .ssid()
                .try_into()
                .map_err(|_| LinkError::InvalidProfile("SSID"))?,
            password: profile
                .password()
                .try_into()
                .map_err(|_| LinkError::InvalidProfile("password"))?,
            auth_method,
            ..Default::default()
        });

        let mut wifi = self.lock();
        wifi.set_configuration(&config)?;

        // A running interface will not report another start
        if wifi.is_started()? {
            debug!("WiFi already started, requesting association directly");
            wifi.connect()?;
        } else {
            wifi.start()?;
        }

        info!("WiFi initialized in station mode");
        Ok(())
    }

    fn associate(&self) -> Result<(), LinkError> {
        self.lock().connect()?;
        Ok(())
    }

    fn stop(&self) -> Result<(), LinkError> {
        let mut wifi = self.lock();
        if wifi.is_connected()? {
            wifi.disconnect()?;
        }
        wifi.stop()?;
        info!("WiFi disconnected and stopped");
        Ok(())
    }
}

impl AddressResolver for EspStation {
    fn current_address(&self) -> Option<AddressInfo> {
        let ip_info = self.lock().sta_netif().get_ip_info().ok()?;
        if ip_info.ip.is_unspecified() {
            return None;
        }

        Some(AddressInfo {
            address: ip_info.ip,
            netmask: prefix_to_netmask(ip_info.subnet.mask.0),
            gateway: ip_info.subnet.gateway,
        })
    }
}

/// Keeps the event loop subscriptions alive. Drop it to detach the manager.
pub struct EventBridge {
    _wifi: EspSubscription<'static, System>,
    _ip: EspSubscription<'static, System>,
}

/// Forward station WiFi and IP events from `sysloop` to `manager`.
pub fn subscribe_events<L, R>(
    sysloop: &EspSystemEventLoop,
    manager: Arc<ConnectionManager<L, R>>,
) -> Result<EventBridge, EspError>
where
    L: StationLink + 'static,
    R: AddressResolver + 'static,
{
    let wifi_manager = manager.clone();
    let wifi = sysloop.subscribe::<WifiEvent, _>(move |event| {
        let event = match event {
            WifiEvent::StaStarted => StationEvent::InterfaceStarted,
            WifiEvent::StaConnected(_) => StationEvent::Associated,
            WifiEvent::StaDisconnected(info) => {
                StationEvent::Disassociated((info.reason() as u16).into())
            }
            _ => return,
        };
        wifi_manager.handle_event(event);
    })?;

    let ip = sysloop.subscribe::<IpEvent, _>(move |event| {
        if let IpEvent::DhcpIpAssigned(_) = event {
            manager.handle_event(StationEvent::AddressAcquired);
        }
    })?;

    Ok(EventBridge {
        _wifi: wifi,
        _ip: ip,
    })
}
