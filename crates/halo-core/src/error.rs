//! Error types for halo-core.
//!
//! Relay commands fail in one of four ways, each surfaced as its own
//! [`Error`] variant so callers can tell them apart:
//!
//! | Error | Cause | Transport touched | Connection closed |
//! |-------|-------|-------------------|-------------------|
//! | [`Error::InvalidOutputIndex`] | Output outside `1..=4` | No | n/a |
//! | [`Error::ConnectionFailed`] | Connect failed or timed out | Yes | n/a |
//! | [`Error::AuthenticationFailed`] | Session key read or auth write failed | Yes | Yes |
//! | [`Error::CommandWriteFailed`] | Encrypted command write failed | Yes | Yes |
//!
//! None of these are retried by this crate. Whether to retry a whole command
//! is the caller's decision; `InvalidOutputIndex` should never be retried.
//!
//! The transport layer reports its own failures as [`TransportError`],
//! which the command errors above wrap as their `source`.

use std::time::Duration;

use thiserror::Error;

use halo_types::FrameError;

/// Errors that can occur when commanding a Halo controller.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Relay output outside the supported range. Caller error.
    #[error("Invalid relay output index {output}: expected 1 to 4")]
    InvalidOutputIndex {
        /// The rejected output number.
        output: u8,
    },

    /// Relay command could not be built for a reason other than its index.
    #[error("Invalid relay command: {0}")]
    InvalidCommand(FrameError),

    /// The transport could not establish a connection within the timeout.
    #[error("Connection to {device_id} failed: {source}")]
    ConnectionFailed {
        /// The device identifier that failed to connect.
        device_id: String,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Reading the session key or writing the authentication payload failed.
    #[error("Authentication failed during {stage}: {source}")]
    AuthenticationFailed {
        /// Which authentication step failed.
        stage: AuthStage,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Writing the encrypted command frame failed after authentication.
    #[error("Command write failed: {source}")]
    CommandWriteFailed {
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Step of the session handshake that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// Reading the device-issued session key.
    SessionKeyRead,
    /// Writing the derived authentication payload.
    AuthenticationWrite,
}

impl std::fmt::Display for AuthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionKeyRead => write!(f, "session key read"),
            Self::AuthenticationWrite => write!(f, "authentication write"),
        }
    }
}

/// Errors reported by a [`Transport`](crate::transport::Transport) or
/// [`Connection`](crate::transport::Connection).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// Operation attempted on a closed connection.
    #[error("Not connected to device")]
    NotConnected,

    /// Required BLE characteristic not found on device.
    #[error("Characteristic not found: {uuid} (searched in {service_count} services)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
        /// Number of services that were searched.
        service_count: usize,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// The device returned unusable data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No device name or address was given.
    NoIdentifier,
    /// Device with specified name/address not found.
    NotFound { identifier: String },
    /// Scan timed out before finding device.
    ScanTimeout { duration: Duration },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoIdentifier => write!(f, "no device name or address given"),
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
            Self::ScanTimeout { duration } => write!(f, "scan timed out after {:?}", duration),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a connection failure for a device.
    pub fn connection_failed(device_id: impl Into<String>, source: TransportError) -> Self {
        Self::ConnectionFailed {
            device_id: device_id.into(),
            source,
        }
    }

    /// Create an authentication failure for a handshake step.
    pub fn authentication_failed(stage: AuthStage, source: TransportError) -> Self {
        Self::AuthenticationFailed { stage, source }
    }

    /// Create a command write failure.
    pub fn command_write_failed(source: TransportError) -> Self {
        Self::CommandWriteFailed { source }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// True for errors caused by the caller's input rather than the device.
    ///
    /// These never reach the transport and retrying them cannot succeed.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOutputIndex { .. } | Error::InvalidCommand(_) | Error::InvalidConfig(_)
        )
    }
}

impl TransportError {
    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl Into<String>, service_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.into(),
            service_count,
        }
    }
}

impl From<FrameError> for Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::InvalidOutputIndex(output) => Error::InvalidOutputIndex { output },
            other => Error::InvalidCommand(other),
        }
    }
}

/// Result type alias using halo-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;
