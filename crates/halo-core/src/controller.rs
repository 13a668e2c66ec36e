//! The Halo controller device object.
//!
//! [`HaloController`] ties together a transport, a cipher, the device
//! access code and a [`SessionGate`]. Each relay request validates the
//! output, waits for the gate, then runs one [`SecureCommandSession`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use halo_types::{RelayAction, RelayCommand};

use crate::config::ControllerConfig;
use crate::crypto::SessionCipher;
use crate::error::{Error, Result};
use crate::gate::SessionGate;
use crate::session::SecureCommandSession;
use crate::traits::RelayControl;
use crate::transport::Transport;

/// A Halo chlorinator that accepts relay commands.
///
/// # Example
///
/// ```
/// use halo_core::mock::{MockCipher, MockTransport};
/// use halo_core::{ControllerConfig, HaloController, RelayAction, RelayControl};
///
/// #[tokio::main]
/// async fn main() -> halo_core::Result<()> {
///     let transport = MockTransport::new("HCHLOR-TEST");
///     let config = ControllerConfig::new("HCHLOR-TEST", "1234");
///     let controller = HaloController::new(transport.clone(), MockCipher::new(), config)?;
///
///     controller.request_action(2, RelayAction::Auto).await?;
///     assert_eq!(transport.disconnect_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct HaloController<T, C> {
    transport: T,
    cipher: C,
    config: ControllerConfig,
    gate: Arc<SessionGate>,
}

impl<T: Transport, C: SessionCipher> HaloController<T, C> {
    /// Create a controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails
    /// validation, names no device or has no access code.
    pub fn new(transport: T, cipher: C, config: ControllerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::invalid_config(e.to_string()))?;
        if config.device.trim().is_empty() {
            return Err(Error::invalid_config("device is not set"));
        }
        if config.access_code.is_empty() {
            return Err(Error::invalid_config("access code is not set"));
        }

        let gate = Arc::new(SessionGate::with_poll_interval(config.gate_poll_interval()));
        Ok(Self {
            transport,
            cipher,
            config,
            gate,
        })
    }

    /// Share a gate with other controllers for the same device.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<SessionGate>) -> Self {
        self.gate = gate;
        self
    }

    /// The device identifier.
    pub fn device_id(&self) -> &str {
        self.transport.device_id()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The active configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// This controller's session gate.
    pub fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    /// Send a relay command.
    ///
    /// The output is validated before the gate is touched, so invalid
    /// requests never wait behind a running session. The gate stays held
    /// until the session's connection is closed, including when this future
    /// is cancelled mid-session.
    pub async fn send_command(&self, command: RelayCommand) -> Result<()> {
        command.validate()?;

        let session = SecureCommandSession::new(&self.transport, &self.cipher)
            .characteristics(self.config.characteristics)
            .connect_timeout(self.config.connect_timeout());

        let permit = Arc::clone(&self.gate).acquire_owned().await;
        session
            .execute_holding(permit, &self.config.access_code, &command)
            .await
    }
}

#[async_trait]
impl<T: Transport, C: SessionCipher> RelayControl for HaloController<T, C> {
    async fn request_action(&self, output: u8, action: RelayAction) -> Result<()> {
        info!("Setting GPO{} to {} on {}", output, action, self.device_id());

        let command = RelayCommand { action, output };
        match self.send_command(command).await {
            Ok(()) => {
                info!("GPO{} set to {}", output, action);
                Ok(())
            }
            Err(e) => {
                error!("Failed to set GPO{} to {}: {}", output, action, e);
                Err(e)
            }
        }
    }
}
