//! Bluetooth Low Energy transport.
//!
//! [`BleTransport`] resolves a configured device name or address to a
//! peripheral and opens one [`BleConnection`] per command session. The
//! adapter is looked up once and reused; the peripheral is found again on
//! every connect, which is cheap once the adapter has seen it.
//!
//! The connect timeout covers the whole of locating, connecting and service
//! discovery. A peripheral that was connected but never handed out as a
//! [`BleConnection`] is disconnected again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::error::{DeviceNotFoundReason, TransportError, TransportResult};
use crate::scan::{
    ScanOptions, create_identifier, find_device, format_peripheral_id, get_adapter,
};
use crate::transport::{Connection, Transport};

/// Default timeout for BLE characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default scan duration when locating the device.
const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(10);

/// Timeouts for BLE operations.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use halo_core::ble::BleOptions;
///
/// let options = BleOptions::default()
///     .read_timeout(Duration::from_secs(15))
///     .scan_duration(Duration::from_secs(20));
/// ```
#[derive(Debug, Clone)]
pub struct BleOptions {
    /// Timeout for BLE read operations.
    pub read_timeout: Duration,
    /// Timeout for BLE write operations.
    pub write_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// How long to scan when the device is not already known.
    pub scan_duration: Duration,
}

impl Default for BleOptions {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            scan_duration: DEFAULT_SCAN_DURATION,
        }
    }
}

impl BleOptions {
    /// Take timeouts from a controller configuration.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            scan_duration: config.scan_timeout(),
            ..Self::default()
        }
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the scan duration.
    #[must_use]
    pub fn scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }
}

/// A Halo controller reachable over BLE.
#[derive(Debug)]
pub struct BleTransport {
    identifier: String,
    options: BleOptions,
    adapter: OnceCell<Adapter>,
}

impl BleTransport {
    /// Create a transport for a device name or address.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_options(identifier, BleOptions::default())
    }

    /// Create a transport with custom timeouts.
    pub fn with_options(identifier: impl Into<String>, options: BleOptions) -> Self {
        Self {
            identifier: identifier.into(),
            options,
            adapter: OnceCell::new(),
        }
    }

    /// Create a transport for the device named in a configuration.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::with_options(config.device.clone(), BleOptions::from_config(config))
    }

    /// The configured timeouts.
    pub fn options(&self) -> &BleOptions {
        &self.options
    }

    async fn adapter(&self) -> TransportResult<&Adapter> {
        self.adapter.get_or_try_init(get_adapter).await
    }

    async fn open(&self, peripheral: Peripheral) -> TransportResult<BleConnection> {
        info!("Connecting to device...");
        peripheral.connect().await?;
        info!("Connected!");

        let link = LinkGuard::new({
            let peripheral = peripheral.clone();
            move || disconnect_in_background(peripheral)
        });

        info!("Discovering services...");
        timeout(self.options.discovery_timeout, peripheral.discover_services())
            .await
            .map_err(|_| {
                TransportError::timeout("discover services", self.options.discovery_timeout)
            })??;

        let services = peripheral.services();
        debug!("Found {} services", services.len());

        let mut characteristics = HashMap::new();
        for service in &services {
            debug!("  Service: {}", service.uuid);
            for char in &service.characteristics {
                debug!("    Characteristic: {}", char.uuid);
                characteristics.insert(char.uuid, char.clone());
            }
        }

        let properties = peripheral.properties().await?;
        let address = properties
            .as_ref()
            .map(|p| create_identifier(&p.address.to_string(), &peripheral.id()))
            .unwrap_or_else(|| format_peripheral_id(&peripheral.id()));

        link.disarm();
        Ok(BleConnection {
            peripheral,
            address,
            service_count: services.len(),
            characteristics,
            read_timeout: self.options.read_timeout,
            write_timeout: self.options.write_timeout,
            disconnected: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Transport for BleTransport {
    type Connection = BleConnection;

    fn device_id(&self) -> &str {
        &self.identifier
    }

    /// Locate the device, connect and discover services.
    ///
    /// `timeout` bounds all three steps together. If it runs out while the
    /// device is still being looked for, the scan is stopped and a
    /// [`DeviceNotFoundReason::ScanTimeout`] is returned.
    #[tracing::instrument(level = "info", skip(self), fields(identifier = %self.identifier))]
    async fn connect(&self, connect_timeout: Duration) -> TransportResult<BleConnection> {
        if self.identifier.trim().is_empty() {
            return Err(TransportError::DeviceNotFound(
                DeviceNotFoundReason::NoIdentifier,
            ));
        }

        let located = AtomicBool::new(false);
        let result = within(connect_timeout, async {
            let adapter = self.adapter().await?;
            let options = ScanOptions::new()
                .duration(self.options.scan_duration)
                .all_devices();
            let peripheral = find_device(adapter, &self.identifier, &options).await?;
            located.store(true, Ordering::SeqCst);
            let connection = self.open(peripheral).await?;
            Ok::<_, TransportError>(connection)
        })
        .await;

        match result {
            Some(result) => result,
            None if located.load(Ordering::SeqCst) => {
                Err(TransportError::timeout("connect to device", connect_timeout))
            }
            None => {
                if let Some(adapter) = self.adapter.get() {
                    if let Err(e) = adapter.stop_scan().await {
                        debug!("Failed to stop scan after timeout: {}", e);
                    }
                }
                Err(TransportError::DeviceNotFound(
                    DeviceNotFoundReason::ScanTimeout {
                        duration: connect_timeout,
                    },
                ))
            }
        }
    }
}

/// Run `operation` with a deadline, returning `None` if it ran out.
async fn within<F: Future>(deadline: Duration, operation: F) -> Option<F::Output> {
    timeout(deadline, operation).await.ok()
}

/// Runs a cleanup action on drop unless disarmed.
///
/// Dropping happens on an early `?` return as well as when the enclosing
/// future is cancelled.
struct LinkGuard<F: FnOnce()> {
    cleanup: Option<F>,
}

impl<F: FnOnce()> LinkGuard<F> {
    fn new(cleanup: F) -> Self {
        Self {
            cleanup: Some(cleanup),
        }
    }

    fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl<F: FnOnce()> Drop for LinkGuard<F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

fn disconnect_in_background(peripheral: Peripheral) {
    let id = format_peripheral_id(&peripheral.id());
    warn!(
        peripheral = %id,
        "Connection setup did not complete - performing best-effort disconnect"
    );

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(async move {
            if let Err(e) = peripheral.disconnect().await {
                warn!(peripheral = %id, error = %e, "Best-effort disconnect failed");
            }
        });
    }
}

/// An open BLE connection to a Halo controller.
///
/// Call [`Connection::disconnect`] before dropping the connection. If it is
/// dropped while still connected, a warning is logged and a best-effort
/// disconnect is spawned.
pub struct BleConnection {
    peripheral: Peripheral,
    address: String,
    service_count: usize,
    characteristics: HashMap<Uuid, Characteristic>,
    read_timeout: Duration,
    write_timeout: Duration,
    disconnected: AtomicBool,
}

impl std::fmt::Debug for BleConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BleConnection")
            .field("address", &self.address)
            .field("characteristics", &self.characteristics.len())
            .finish_non_exhaustive()
    }
}

impl BleConnection {
    /// The device address or identifier.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn find_characteristic(&self, uuid: Uuid) -> TransportResult<&Characteristic> {
        self.characteristics
            .get(&uuid)
            .ok_or_else(|| {
                TransportError::characteristic_not_found(uuid.to_string(), self.service_count)
            })
    }
}

#[async_trait]
impl Connection for BleConnection {
    async fn read_characteristic(&self, uuid: Uuid) -> TransportResult<Vec<u8>> {
        let characteristic = self.find_characteristic(uuid)?;
        let data = timeout(self.read_timeout, self.peripheral.read(characteristic))
            .await
            .map_err(|_| {
                TransportError::timeout(format!("read characteristic {}", uuid), self.read_timeout)
            })??;
        Ok(data)
    }

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> TransportResult<()> {
        let characteristic = self.find_characteristic(uuid)?;
        timeout(
            self.write_timeout,
            self.peripheral
                .write(characteristic, data, WriteType::WithResponse),
        )
        .await
        .map_err(|_| {
            TransportError::timeout(format!("write characteristic {}", uuid), self.write_timeout)
        })??;
        Ok(())
    }

    #[tracing::instrument(level = "info", skip(self), fields(address = %self.address))]
    async fn disconnect(self) -> TransportResult<()> {
        info!("Disconnecting from device...");
        self.disconnected.store(true, Ordering::SeqCst);
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

impl Drop for BleConnection {
    fn drop(&mut self) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }

        warn!(
            device_address = %self.address,
            "BleConnection dropped without calling disconnect() - performing best-effort cleanup"
        );

        let peripheral = self.peripheral.clone();
        let address = self.address.clone();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = peripheral.disconnect().await {
                    debug!(
                        device_address = %address,
                        error = %e,
                        "Best-effort disconnect failed (device may already be disconnected)"
                    );
                }
            });
        }
    }
}
