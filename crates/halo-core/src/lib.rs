//! Core BLE library for commanding AstralPool Halo relay outputs.
//!
//! This crate sends authenticated relay commands to a Halo chlorinator's
//! general purpose outputs (GPO1 to GPO4) over Bluetooth Low Energy.
//!
//! # Features
//!
//! - **Session handshake**: read the per-connection session key and push
//!   the derived authentication payload
//! - **Encrypted commands**: encode, encrypt and write relay command frames
//! - **Session serialization**: one command session per device at a time
//! - **Select workflow**: Off / Auto / On control with state refresh
//! - **Pluggable transport and cipher**: BLE via btleplug, or the in-memory
//!   mock for tests
//!
//! # Command Lifecycle
//!
//! Each relay request is its own short-lived session:
//!
//! 1. The output number is validated (1 to 4)
//! 2. The [`SessionGate`] waits until no other session is running
//! 3. A connection is opened with a bounded timeout
//! 4. The session key is read and the authentication payload written
//! 5. The command frame is encrypted under the session key and written
//! 6. The connection is closed, whatever happened in steps 4 and 5
//!
//! # Cipher
//!
//! The controller's key derivation and payload encryption are vendor
//! primitives and are not part of this crate. Provide them by implementing
//! [`SessionCipher`].
//!
//! # Quick Start
//!
//! ```no_run
//! use halo_core::ble::BleTransport;
//! use halo_core::{
//!     AccessCode, ControllerConfig, HaloController, RelayAction, RelayControl, SessionCipher,
//!     SessionKey,
//! };
//!
//! struct VendorCipher;
//!
//! impl SessionCipher for VendorCipher {
//!     fn derive_auth_key(&self, key: &SessionKey, code: &AccessCode) -> Vec<u8> {
//!         unimplemented!()
//!     }
//!     fn encrypt(&self, plaintext: &[u8], key: &SessionKey) -> Vec<u8> {
//!         unimplemented!()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ControllerConfig::load_default()?;
//!     let transport = BleTransport::from_config(&config);
//!     let controller = HaloController::new(transport, VendorCipher, config)?;
//!
//!     controller.request_action(2, RelayAction::On).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod ble;
pub mod capabilities;
pub mod config;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod guard;
pub mod mock;
pub mod scan;
pub mod select;
pub mod session;
pub mod traits;
pub mod transport;

// Core exports
pub use auth::SessionAuthenticator;
pub use capabilities::{Capability, CapabilityRegistry};
pub use config::{CharacteristicMap, ConfigError, ControllerConfig, ValidationError};
pub use controller::HaloController;
pub use crypto::{AccessCode, SessionCipher, SessionKey};
pub use error::{
    AuthStage, DeviceNotFoundReason, Error, Result, TransportError, TransportResult,
};
pub use gate::{OwnedSessionPermit, SessionGate, SessionPermit};
pub use guard::ConnectionGuard;
pub use scan::{DiscoveredController, ScanOptions};
pub use select::RelaySelect;
pub use session::SecureCommandSession;
pub use traits::{RelayControl, StateRefresher};
pub use transport::{Connection, Transport};

// Re-export from halo-types
pub use halo_types::uuid as uuids;
pub use halo_types::{
    CommandFrame, FRAME_LEN, FrameError, GpoMode, MAX_OUTPUT, MIN_OUTPUT, RelayAction,
    RelayCommand,
};
