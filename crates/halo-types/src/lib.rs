//! Platform-agnostic relay command types for AstralPool Halo controllers.
//!
//! This crate provides the protocol values shared by the BLE client in
//! halo-core and any other front end that needs to build relay commands
//! without touching Bluetooth.
//!
//! # Features
//!
//! - Relay actions and validated relay commands
//! - Reported output modes
//! - The fixed 20-byte relay command frame encoder
//! - UUID constants for the session and command characteristics
//! - Error types for command validation
//!
//! # Example
//!
//! ```
//! use halo_types::{CommandFrame, RelayAction, RelayCommand};
//!
//! let command = RelayCommand::new(RelayAction::On, 4).unwrap();
//! let frame = CommandFrame::encode(&command).unwrap();
//! assert_eq!(&frame.as_bytes()[..5], &[0x03, 0xF8, 0x01, 0x03, 0x03]);
//! ```

pub mod error;
pub mod frame;
pub mod types;
pub mod uuid;

pub use error::{FrameError, FrameResult};
pub use frame::{CommandFrame, FRAME_LEN, RELAY_COMMAND_HEADER};
pub use types::{
    GpoMode, MAX_OUTPUT, MIN_OUTPUT, RelayAction, RelayCommand, is_valid_output,
};
pub use crate::uuid as uuids;
