//! Mock transport implementation for testing.
//!
//! This module provides an in-memory controller that can be used for unit
//! testing without requiring actual BLE hardware.
//!
//! [`MockTransport`] implements [`Transport`], so it can be handed to a
//! [`HaloController`](crate::HaloController) in place of a real
//! [`BleTransport`](crate::ble::BleTransport). Every transport call is
//! recorded for later inspection.
//!
//! # Features
//!
//! - **Call recording**: connect, read, write and disconnect in order
//! - **Session key rotation**: every connection is issued a fresh key
//! - **Failure injection**: fail connects, reads or writes per characteristic
//! - **Latency simulation**: delay connects, writes and disconnects to exercise contention

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::crypto::{AccessCode, SessionCipher, SessionKey};
use crate::error::{TransportError, TransportResult};
use crate::transport::{Connection, Transport};
use halo_types::uuids::SESSION_KEY;

/// A transport operation observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// A connection attempt (successful or not).
    Connect,
    /// A characteristic read.
    Read(Uuid),
    /// A characteristic write with its payload.
    Write { uuid: Uuid, data: Vec<u8> },
    /// A disconnect.
    Disconnect,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Mutex<Vec<TransportCall>>,
    characteristics: Mutex<HashMap<Uuid, Vec<u8>>>,
    session_keys: Mutex<VecDeque<Vec<u8>>>,
    issued_keys: Mutex<Vec<Vec<u8>>>,
    connect_failure: Mutex<Option<String>>,
    failing_reads: Mutex<HashSet<Uuid>>,
    failing_writes: Mutex<HashSet<Uuid>>,
    connect_latency_ms: AtomicU64,
    write_latency_ms: AtomicU64,
    disconnect_latency_ms: AtomicU64,
    connections: AtomicU32,
    active: AtomicU32,
    max_active: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockState {
    fn record(&self, call: TransportCall) {
        lock(&self.calls).push(call);
    }
}

/// A mock Halo controller for testing.
///
/// Cloning a `MockTransport` yields another handle to the same simulated
/// device, so a test can keep one handle for inspection while the
/// controller owns the other.
///
/// # Example
///
/// ```
/// use halo_core::mock::{MockTransport, TransportCall};
/// use halo_core::transport::{Connection, Transport};
/// use halo_core::uuids::SESSION_KEY;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let transport = MockTransport::new("HCHLOR-TEST");
///     let conn = transport.connect(Duration::from_secs(10)).await.unwrap();
///     let key = conn.read_characteristic(SESSION_KEY).await.unwrap();
///     conn.disconnect().await.unwrap();
///
///     assert_eq!(key.len(), 16);
///     assert_eq!(transport.calls().first(), Some(&TransportCall::Connect));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    device_id: String,
    session_key_uuid: Uuid,
    state: Arc<MockState>,
}

impl MockTransport {
    /// Create a new mock controller.
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            session_key_uuid: SESSION_KEY,
            state: Arc::new(MockState::default()),
        }
    }

    /// Serve session keys from a different characteristic.
    #[must_use]
    pub fn with_session_key_characteristic(mut self, uuid: Uuid) -> Self {
        self.session_key_uuid = uuid;
        self
    }

    /// Create a mock controller with a random identifier.
    pub fn random() -> Self {
        Self::new(&format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF))
    }

    // --- Test control methods ---

    /// Queue session keys to issue on the next connections, in order.
    ///
    /// Once the queue is empty, connection `n` is issued sixteen bytes of `n`.
    pub fn queue_session_keys<I>(&self, keys: I)
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        lock(&self.state.session_keys).extend(keys);
    }

    /// Set the value returned when reading a characteristic.
    pub fn set_characteristic(&self, uuid: Uuid, value: Vec<u8>) {
        lock(&self.state.characteristics).insert(uuid, value);
    }

    /// Make connection attempts fail with the given message (`None` to clear).
    pub fn set_connect_failure(&self, message: Option<&str>) {
        *lock(&self.state.connect_failure) = message.map(str::to_string);
    }

    /// Make reads of a characteristic fail.
    pub fn fail_reads_of(&self, uuid: Uuid) {
        lock(&self.state.failing_reads).insert(uuid);
    }

    /// Make writes to a characteristic fail.
    pub fn fail_writes_to(&self, uuid: Uuid) {
        lock(&self.state.failing_writes).insert(uuid);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.set_connect_failure(None);
        lock(&self.state.failing_reads).clear();
        lock(&self.state.failing_writes).clear();
    }

    /// Set simulated connect latency.
    ///
    /// A latency longer than the caller's connect timeout makes the
    /// attempt time out.
    pub fn set_connect_latency(&self, latency: Duration) {
        self.state
            .connect_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Set simulated write latency.
    pub fn set_write_latency(&self, latency: Duration) {
        self.state
            .write_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Set simulated disconnect latency.
    ///
    /// The connection still counts as active until the latency has passed.
    pub fn set_disconnect_latency(&self, latency: Duration) {
        self.state
            .disconnect_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    // --- Inspection methods ---

    /// All recorded transport calls, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        lock(&self.state.calls).clone()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        lock(&self.state.calls).clear();
    }

    /// Number of connection attempts.
    pub fn connect_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Connect))
    }

    /// Number of characteristic reads.
    pub fn read_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Read(_)))
    }

    /// Number of characteristic writes, successful or not.
    pub fn write_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Write { .. }))
    }

    /// Number of disconnects.
    pub fn disconnect_count(&self) -> usize {
        self.count(|c| matches!(c, TransportCall::Disconnect))
    }

    /// Payloads written to a characteristic, in order.
    pub fn writes_to(&self, uuid: Uuid) -> Vec<Vec<u8>> {
        lock(&self.state.calls)
            .iter()
            .filter_map(|c| match c {
                TransportCall::Write { uuid: u, data } if *u == uuid => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Session keys issued so far, one per successful connection.
    pub fn issued_session_keys(&self) -> Vec<Vec<u8>> {
        lock(&self.state.issued_keys).clone()
    }

    /// Connections currently open.
    pub fn active_connections(&self) -> u32 {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open connections observed.
    pub fn max_concurrent_connections(&self) -> u32 {
        self.state.max_active.load(Ordering::SeqCst)
    }

    fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        lock(&self.state.calls).iter().filter(|c| pred(c)).count()
    }

    fn next_session_key(&self, connection: u32) -> Vec<u8> {
        lock(&self.state.session_keys)
            .pop_front()
            .unwrap_or_else(|| vec![connection as u8; 16])
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Connection = MockConnection;

    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn connect(&self, timeout: Duration) -> TransportResult<MockConnection> {
        self.state.record(TransportCall::Connect);

        let latency = Duration::from_millis(self.state.connect_latency_ms.load(Ordering::Relaxed));
        if !latency.is_zero() {
            if latency > timeout {
                tokio::time::sleep(timeout).await;
                return Err(TransportError::timeout("connect to device", timeout));
            }
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = lock(&self.state.connect_failure).clone() {
            return Err(TransportError::Other(message));
        }

        let connection = self.state.connections.fetch_add(1, Ordering::SeqCst) + 1;
        let session_key = self.next_session_key(connection);
        lock(&self.state.issued_keys).push(session_key.clone());

        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(MockConnection {
            state: Arc::clone(&self.state),
            session_key_uuid: self.session_key_uuid,
            session_key,
            closed: false,
        })
    }
}

/// An open connection to a [`MockTransport`].
#[derive(Debug)]
pub struct MockConnection {
    state: Arc<MockState>,
    session_key_uuid: Uuid,
    session_key: Vec<u8>,
    closed: bool,
}

#[async_trait]
impl Connection for MockConnection {
    async fn read_characteristic(&self, uuid: Uuid) -> TransportResult<Vec<u8>> {
        self.state.record(TransportCall::Read(uuid));

        if lock(&self.state.failing_reads).contains(&uuid) {
            return Err(TransportError::Other(format!("mock read of {} failed", uuid)));
        }
        if uuid == self.session_key_uuid {
            return Ok(self.session_key.clone());
        }
        lock(&self.state.characteristics)
            .get(&uuid)
            .cloned()
            .ok_or_else(|| TransportError::characteristic_not_found(uuid.to_string(), 1))
    }

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> TransportResult<()> {
        let latency = Duration::from_millis(self.state.write_latency_ms.load(Ordering::Relaxed));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.state.record(TransportCall::Write {
            uuid,
            data: data.to_vec(),
        });

        if lock(&self.state.failing_writes).contains(&uuid) {
            return Err(TransportError::Other(format!("mock write to {} failed", uuid)));
        }
        Ok(())
    }

    async fn disconnect(mut self) -> TransportResult<()> {
        self.state.record(TransportCall::Disconnect);
        let latency =
            Duration::from_millis(self.state.disconnect_latency_ms.load(Ordering::Relaxed));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.closed = true;
        self.state.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if !self.closed {
            warn!("MockConnection dropped without calling disconnect()");
            self.state.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// A transparent stand-in for the vendor cipher.
///
/// The derived authentication payload is the session key followed by the
/// access code, and encryption XORs the plaintext with the repeating session
/// key. Both are trivially reversible so tests can check which key was used.
#[derive(Debug, Default)]
pub struct MockCipher {
    derive_calls: AtomicU32,
    encrypt_calls: AtomicU32,
}

impl MockCipher {
    /// Create a new mock cipher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Undo [`SessionCipher::encrypt`] for the given raw key bytes.
    pub fn decrypt(ciphertext: &[u8], session_key: &[u8]) -> Vec<u8> {
        xor_with_key(ciphertext, session_key)
    }

    /// Number of key derivations performed.
    pub fn derive_count(&self) -> u32 {
        self.derive_calls.load(Ordering::Relaxed)
    }

    /// Number of encryptions performed.
    pub fn encrypt_count(&self) -> u32 {
        self.encrypt_calls.load(Ordering::Relaxed)
    }
}

fn xor_with_key(data: &[u8], key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

impl SessionCipher for MockCipher {
    fn derive_auth_key(&self, session_key: &SessionKey, access_code: &AccessCode) -> Vec<u8> {
        self.derive_calls.fetch_add(1, Ordering::Relaxed);
        let mut payload = session_key.as_bytes().to_vec();
        payload.extend_from_slice(access_code.as_bytes());
        payload
    }

    fn encrypt(&self, plaintext: &[u8], session_key: &SessionKey) -> Vec<u8> {
        self.encrypt_calls.fetch_add(1, Ordering::Relaxed);
        xor_with_key(plaintext, session_key.as_bytes())
    }
}
