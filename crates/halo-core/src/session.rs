//! Secure command sessions.
//!
//! A session carries one relay command over one connection:
//! connect, authenticate, encode, encrypt, write, disconnect. Every session
//! reads a fresh session key; keys are never carried between sessions.
//!
//! Once connected, the connection is closed exactly once whatever the
//! outcome. A failing disconnect is logged and never replaces the result
//! of the command itself.

use std::time::Duration;

use tracing::{debug, info, warn};

use halo_types::{CommandFrame, RelayCommand};

use crate::auth::SessionAuthenticator;
use crate::config::CharacteristicMap;
use crate::crypto::{AccessCode, SessionCipher};
use crate::error::{Error, Result};
use crate::gate::OwnedSessionPermit;
use crate::guard::ConnectionGuard;
use crate::transport::{Connection, Transport};

/// Default connection timeout for a command session.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes relay commands over an authenticated, single-use connection.
///
/// The session does not serialize itself; run it under a
/// [`SessionGate`](crate::gate::SessionGate) when more than one command may
/// be in flight.
#[derive(Debug)]
pub struct SecureCommandSession<'a, T: ?Sized, C: ?Sized> {
    transport: &'a T,
    cipher: &'a C,
    characteristics: CharacteristicMap,
    connect_timeout: Duration,
}

impl<'a, T, C> SecureCommandSession<'a, T, C>
where
    T: Transport + ?Sized,
    C: SessionCipher + ?Sized,
{
    /// Create a session over a transport and cipher with default settings.
    pub fn new(transport: &'a T, cipher: &'a C) -> Self {
        Self {
            transport,
            cipher,
            characteristics: CharacteristicMap::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Use a different set of characteristics.
    #[must_use]
    pub fn characteristics(mut self, characteristics: CharacteristicMap) -> Self {
        self.characteristics = characteristics;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Execute one relay command.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidOutputIndex`] if the output is outside `1..=4`; the
    ///   transport is not touched.
    /// - [`Error::ConnectionFailed`] if no connection could be opened in time.
    /// - [`Error::AuthenticationFailed`] if the handshake failed.
    /// - [`Error::CommandWriteFailed`] if the encrypted frame write failed.
    pub async fn execute(
        &self,
        access_code: &AccessCode,
        command: &RelayCommand,
    ) -> Result<()> {
        self.execute_inner(None, access_code, command).await
    }

    /// Execute one relay command while holding a gate permit.
    ///
    /// The permit is released once the connection is closed. If this future
    /// is cancelled after connecting, the permit is held until the spawned
    /// disconnect has finished, so the next session cannot overlap the old
    /// link.
    ///
    /// # Errors
    ///
    /// As for [`execute`](Self::execute).
    pub async fn execute_holding(
        &self,
        permit: OwnedSessionPermit,
        access_code: &AccessCode,
        command: &RelayCommand,
    ) -> Result<()> {
        self.execute_inner(Some(permit), access_code, command).await
    }

    async fn execute_inner(
        &self,
        permit: Option<OwnedSessionPermit>,
        access_code: &AccessCode,
        command: &RelayCommand,
    ) -> Result<()> {
        command.validate()?;

        let device_id = self.transport.device_id();
        debug!("Connecting to {} (timeout {:?})", device_id, self.connect_timeout);

        let connection = self
            .transport
            .connect(self.connect_timeout)
            .await
            .map_err(|e| Error::connection_failed(device_id, e))?;
        let mut guard = ConnectionGuard::new(connection);
        if let Some(permit) = permit {
            guard = guard.holding(permit);
        }

        let result = self.run(&*guard, access_code, command).await;

        if let Err(e) = guard.close().await {
            warn!("Failed to disconnect from {}: {}", device_id, e);
        } else {
            debug!("Disconnected from {}", device_id);
        }

        result
    }

    async fn run<N>(
        &self,
        connection: &N,
        access_code: &AccessCode,
        command: &RelayCommand,
    ) -> Result<()>
    where
        N: Connection + ?Sized,
    {
        let session_key = SessionAuthenticator::new(self.cipher, self.characteristics)
            .authenticate(connection, access_code)
            .await?;

        let frame = CommandFrame::encode(command)?;
        debug!("Encoded {} as {}", command, frame);

        let ciphertext = self.cipher.encrypt(frame.as_bytes(), &session_key);
        connection
            .write_characteristic(self.characteristics.command, &ciphertext)
            .await
            .map_err(Error::command_write_failed)?;

        info!("Sent {} to {}", command, self.transport.device_id());
        Ok(())
    }
}
