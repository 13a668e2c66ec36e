//! Controller discovery and scanning.
//!
//! This module scans for Halo chlorinators over Bluetooth Low Energy and
//! resolves a configured name or address to a peripheral.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use halo_types::uuids::{ASTRALPOOL_SERVICE, DEVICE_NAME_PREFIXES};

use crate::error::{DeviceNotFoundReason, TransportError, TransportResult};

/// Information about a discovered controller.
#[derive(Debug, Clone)]
pub struct DiscoveredController {
    /// The advertised name (e.g., "HCHLOR-1A2B3C").
    pub name: Option<String>,
    /// The peripheral ID for connecting.
    pub id: PeripheralId,
    /// The BLE address as a string (may be zeros on macOS, use `identifier` instead).
    pub address: String,
    /// A connection identifier (peripheral ID on macOS, address on other platforms).
    pub identifier: String,
    /// RSSI signal strength.
    pub rssi: Option<i16>,
    /// Whether the peripheral looks like a Halo controller.
    pub is_halo: bool,
}

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
    /// Only return devices that appear to be Halo controllers.
    pub filter_halo_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            filter_halo_only: true,
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set whether to filter for Halo controllers only.
    #[must_use]
    pub fn filter_halo_only(mut self, filter: bool) -> Self {
        self.filter_halo_only = filter;
        self
    }

    /// Scan for all BLE devices, not just Halo controllers.
    #[must_use]
    pub fn all_devices(self) -> Self {
        self.filter_halo_only(false)
    }
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> TransportResult<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(TransportError::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for controllers with custom options.
///
/// An empty list means nothing was found and is not an error.
///
/// # Errors
///
/// Returns an error if no Bluetooth adapter is available or the scan could
/// not be started or stopped.
pub async fn scan_with_options(options: ScanOptions) -> TransportResult<Vec<DiscoveredController>> {
    let adapter = get_adapter().await?;
    scan_with_adapter(&adapter, options).await
}

/// Scan for controllers using a specific adapter.
pub async fn scan_with_adapter(
    adapter: &Adapter,
    options: ScanOptions,
) -> TransportResult<Vec<DiscoveredController>> {
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let peripherals = adapter.peripherals().await?;
    let results = join_all(
        peripherals
            .iter()
            .map(|peripheral| process_peripheral(peripheral, options.filter_halo_only)),
    )
    .await;

    let mut discovered = Vec::new();
    for result in results {
        match result {
            Ok(Some(device)) => {
                info!("Found controller: {:?}", device.name);
                discovered.push(device);
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Error processing peripheral: {}", e);
            }
        }
    }

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

async fn process_peripheral(
    peripheral: &Peripheral,
    filter_halo_only: bool,
) -> TransportResult<Option<DiscoveredController>> {
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };

    let is_halo = is_halo_device(&properties);
    if filter_halo_only && !is_halo {
        return Ok(None);
    }

    let id = peripheral.id();
    let address = properties.address.to_string();
    let identifier = create_identifier(&address, &id);

    Ok(Some(DiscoveredController {
        name: properties.local_name,
        id,
        address,
        identifier,
        rssi: properties.rssi,
        is_halo,
    }))
}

fn is_halo_device(properties: &PeripheralProperties) -> bool {
    if properties.services.contains(&ASTRALPOOL_SERVICE)
        || properties.service_data.contains_key(&ASTRALPOOL_SERVICE)
    {
        return true;
    }

    properties
        .local_name
        .as_deref()
        .is_some_and(is_halo_name)
}

/// Whether an advertised name looks like a Halo controller.
pub fn is_halo_name(name: &str) -> bool {
    let name = name.to_lowercase();
    DEVICE_NAME_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(&prefix.to_lowercase()))
}

/// Find a specific device by name or address.
///
/// Known peripherals are checked first. Otherwise up to three scans are
/// made with increasing durations, since advertisements are easily missed.
pub async fn find_device(
    adapter: &Adapter,
    identifier: &str,
    options: &ScanOptions,
) -> TransportResult<Peripheral> {
    let identifier_lower = identifier.to_lowercase();

    info!("Looking for device: {}", identifier);

    if let Some(peripheral) = find_peripheral_by_identifier(adapter, &identifier_lower).await? {
        info!("Found device in cache (no scan needed)");
        return Ok(peripheral);
    }

    let max_attempts: u32 = 3;
    let base_duration = options.duration.as_millis() as u64 / 2;
    let base_duration = Duration::from_millis(base_duration.max(2000));

    for attempt in 1..=max_attempts {
        let scan_duration = base_duration * attempt;
        info!(
            "Scan attempt {}/{} ({}s)...",
            attempt,
            max_attempts,
            scan_duration.as_secs()
        );

        adapter.start_scan(ScanFilter::default()).await?;
        sleep(scan_duration).await;
        adapter.stop_scan().await?;

        if let Some(peripheral) = find_peripheral_by_identifier(adapter, &identifier_lower).await? {
            info!("Found device on attempt {}", attempt);
            return Ok(peripheral);
        }

        if attempt < max_attempts {
            warn!("Device not found, retrying...");
        }
    }

    warn!(
        "Device not found after {} attempts: {}",
        max_attempts, identifier
    );
    Err(TransportError::device_not_found(identifier))
}

async fn find_peripheral_by_identifier(
    adapter: &Adapter,
    identifier_lower: &str,
) -> TransportResult<Option<Peripheral>> {
    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Ok(Some(props)) = peripheral.properties().await {
            let address = props.address.to_string();
            let peripheral_id = format_peripheral_id(&peripheral.id());

            if matches_identifier(
                identifier_lower,
                &address,
                &peripheral_id,
                props.local_name.as_deref(),
            ) {
                debug!("Matched {} ({:?})", peripheral_id, props.local_name);
                return Ok(Some(peripheral));
            }
        }
    }

    Ok(None)
}

/// Match a lowercase identifier against a peripheral's ID, address or name.
///
/// Peripheral IDs (macOS) and names match on substring; addresses match
/// exactly, with or without colons. A blank identifier matches nothing.
fn matches_identifier(
    identifier_lower: &str,
    address: &str,
    peripheral_id: &str,
    name: Option<&str>,
) -> bool {
    if identifier_lower.trim().is_empty() {
        return false;
    }

    if peripheral_id.to_lowercase().contains(identifier_lower) {
        return true;
    }

    let address = address.to_lowercase();
    if address != "00:00:00:00:00:00"
        && (address == identifier_lower
            || address.replace(':', "") == identifier_lower.replace(':', ""))
    {
        return true;
    }

    name.is_some_and(|n| n.to_lowercase().contains(identifier_lower))
}

/// Format a peripheral ID as a string.
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

/// Pick the connection identifier for a peripheral.
///
/// On macOS, where addresses read as `00:00:00:00:00:00`, this is the
/// peripheral ID; elsewhere it is the Bluetooth address.
pub fn create_identifier(address: &str, peripheral_id: &PeripheralId) -> String {
    if address == "00:00:00:00:00:00" {
        format_peripheral_id(peripheral_id)
    } else {
        address.to_string()
    }
}
