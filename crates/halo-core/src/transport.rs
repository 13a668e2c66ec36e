//! Trait abstractions for the wireless transport.
//!
//! The relay command protocol only needs four operations from the link
//! layer: connect, read a characteristic, write a characteristic and
//! disconnect. [`Transport`] and [`Connection`] capture exactly that so the
//! protocol can run over real Bluetooth ([`crate::ble::BleTransport`]) or the
//! in-memory [`crate::mock::MockTransport`] used in tests.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TransportResult;

/// A device that connections can be opened against.
///
/// # Example
///
/// ```ignore
/// use halo_core::transport::{Connection, Transport};
///
/// async fn read_key<T: Transport>(transport: &T) -> halo_core::TransportResult<Vec<u8>> {
///     let conn = transport.connect(std::time::Duration::from_secs(10)).await?;
///     let key = conn.read_characteristic(halo_core::uuids::SESSION_KEY).await;
///     conn.disconnect().await?;
///     key
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// The connection type produced by [`Transport::connect`].
    type Connection: Connection + 'static;

    /// Identifier of the remote device (MAC address or platform UUID).
    fn device_id(&self) -> &str;

    /// Open a connection, giving up after `timeout`.
    async fn connect(&self, timeout: Duration) -> TransportResult<Self::Connection>;
}

/// An open connection to a device.
///
/// The connection is consumed by [`Connection::disconnect`], so it can only
/// be closed once.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Read the current value of a characteristic.
    async fn read_characteristic(&self, uuid: Uuid) -> TransportResult<Vec<u8>>;

    /// Write a value to a characteristic (with response).
    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> TransportResult<()>;

    /// Close the connection.
    async fn disconnect(self) -> TransportResult<()>;
}
