//! Error types for command encoding in halo-types.

use thiserror::Error;

/// Errors that can occur when building or decoding relay command values.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in halo-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// Relay output index outside the supported `1..=4` range.
    #[error("Invalid relay output index {0}: expected 1 to 4")]
    InvalidOutputIndex(u8),

    /// Byte value that does not map to a relay action.
    #[error("Unknown relay action code: 0x{0:02X}")]
    UnknownAction(u8),

    /// Option string that does not name a relay action.
    #[error("Unknown relay option: {0:?}")]
    UnknownOption(String),
}

/// Result type alias using halo-types' FrameError type.
pub type FrameResult<T> = std::result::Result<T, FrameError>;
