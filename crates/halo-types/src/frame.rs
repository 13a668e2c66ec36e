//! Fixed-layout relay command frames.
//!
//! Every relay action travels as a 20-byte plaintext frame before it is
//! encrypted under the session key:
//!
//! | Offset | Size | Field | Value |
//! |--------|------|-------|-------|
//! | 0 | 3 | Header | `03 F8 01` |
//! | 3 | 1 | Action | [`RelayAction`] code |
//! | 4 | 1 | Output | zero-based output index |
//! | 5 | 15 | Padding | zero |

use core::fmt;

use crate::error::FrameResult;
use crate::types::{RelayAction, RelayCommand};

/// Length of an encoded relay command frame.
pub const FRAME_LEN: usize = 20;

/// Header identifying the relay command family (characteristic 504).
pub const RELAY_COMMAND_HEADER: [u8; 3] = [0x03, 0xF8, 0x01];

const ACTION_OFFSET: usize = 3;
const OUTPUT_OFFSET: usize = 4;

/// An encoded, unencrypted relay command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandFrame([u8; FRAME_LEN]);

impl CommandFrame {
    /// Encode a relay command.
    ///
    /// Fails with [`FrameError::InvalidOutputIndex`](crate::FrameError::InvalidOutputIndex)
    /// when the output is outside `1..=4`; the index is never wrapped or truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use halo_types::{CommandFrame, RelayAction, RelayCommand};
    ///
    /// let cmd = RelayCommand::new(RelayAction::Auto, 2).unwrap();
    /// let frame = CommandFrame::encode(&cmd).unwrap();
    /// assert_eq!(frame.to_hex(), "03f8010201000000000000000000000000000000");
    /// ```
    pub fn encode(command: &RelayCommand) -> FrameResult<Self> {
        let index = command.wire_index()?;

        let mut bytes = [0u8; FRAME_LEN];
        bytes[..RELAY_COMMAND_HEADER.len()].copy_from_slice(&RELAY_COMMAND_HEADER);
        bytes[ACTION_OFFSET] = command.action.code();
        bytes[OUTPUT_OFFSET] = index;

        Ok(Self(bytes))
    }

    /// The raw frame bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Lowercase hex rendering of the frame.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Action code carried by the frame.
    pub fn action_code(&self) -> u8 {
        self.0[ACTION_OFFSET]
    }

    /// Zero-based output index carried by the frame.
    pub fn output_index(&self) -> u8 {
        self.0[OUTPUT_OFFSET]
    }

    /// Decode the action field, if it holds a known code.
    pub fn action(&self) -> FrameResult<RelayAction> {
        RelayAction::try_from(self.action_code())
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<CommandFrame> for Vec<u8> {
    fn from(frame: CommandFrame) -> Self {
        frame.0.to_vec()
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
