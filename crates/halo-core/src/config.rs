//! Controller configuration.
//!
//! Configuration is stored as TOML, by default at
//! `<config dir>/halo/config.toml`:
//!
//! ```toml
//! device = "HCHLOR-1A2B3C"
//! access_code = "1234"
//! connect_timeout_secs = 10
//! gate_poll_interval_ms = 1000
//!
//! [characteristics]
//! session_key = "45000001-98b7-4e29-a03f-160174643002"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use halo_types::uuids::{MASTER_AUTHENTICATION, RX_COMMAND, SESSION_KEY};

use crate::crypto::AccessCode;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Device name or address to connect to.
    pub device: String,
    /// Device access code used to authenticate each session.
    pub access_code: AccessCode,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Characteristic read timeout in seconds.
    pub read_timeout_secs: u64,
    /// Characteristic write timeout in seconds.
    pub write_timeout_secs: u64,
    /// Scan duration in seconds when locating the device.
    pub scan_timeout_secs: u64,
    /// How often a waiter re-checks the session gate, in milliseconds.
    pub gate_poll_interval_ms: u64,
    /// Delay between a successful command and the state refresh, in milliseconds.
    pub settle_delay_ms: u64,
    /// Characteristic UUIDs used by the command protocol.
    pub characteristics: CharacteristicMap,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            access_code: AccessCode::default(),
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            scan_timeout_secs: 10,
            gate_poll_interval_ms: 1000,
            settle_delay_ms: 1000,
            characteristics: CharacteristicMap::default(),
        }
    }
}

impl ControllerConfig {
    /// Create a configuration for a device and access code with default timings.
    pub fn new(device: impl Into<String>, access_code: impl Into<AccessCode>) -> Self {
        Self {
            device: device.into(),
            access_code: access_code.into(),
            ..Self::default()
        }
    }

    /// Connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Characteristic read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Characteristic write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// Scan duration.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// Session gate poll interval.
    pub fn gate_poll_interval(&self) -> Duration {
        Duration::from_millis(self.gate_poll_interval_ms)
    }

    /// Settle delay before a state refresh.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Timeouts are between 1 and 120 seconds
    /// - The gate poll interval is between 10 ms and 60 s
    /// - The settle delay is at most 60 s
    /// - The three protocol characteristics are distinct
    ///
    /// The device and access code may be empty here; they are only required
    /// once a controller is built.
    ///
    /// # Example
    ///
    /// ```
    /// use halo_core::ControllerConfig;
    ///
    /// let config = ControllerConfig::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        for (field, secs) in [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("read_timeout_secs", self.read_timeout_secs),
            ("write_timeout_secs", self.write_timeout_secs),
            ("scan_timeout_secs", self.scan_timeout_secs),
        ] {
            if !(1..=120).contains(&secs) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("{} seconds is out of range (1 to 120)", secs),
                });
            }
        }

        if !(10..=60_000).contains(&self.gate_poll_interval_ms) {
            errors.push(ValidationError {
                field: "gate_poll_interval_ms".to_string(),
                message: format!(
                    "{} ms is out of range (10 to 60000)",
                    self.gate_poll_interval_ms
                ),
            });
        }

        if self.settle_delay_ms > 60_000 {
            errors.push(ValidationError {
                field: "settle_delay_ms".to_string(),
                message: format!("{} ms exceeds 60000", self.settle_delay_ms),
            });
        }

        errors.extend(self.characteristics.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    ///
    /// This is a convenience method that combines `load()` and `validate()`.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Characteristic UUIDs used by the command protocol.
///
/// Defaults to the AstralPool constants in [`halo_types::uuids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacteristicMap {
    /// Read: per-connection session key.
    pub session_key: Uuid,
    /// Write: derived authentication payload.
    pub authentication: Uuid,
    /// Write: encrypted command frames.
    pub command: Uuid,
}

impl Default for CharacteristicMap {
    fn default() -> Self {
        Self {
            session_key: SESSION_KEY,
            authentication: MASTER_AUTHENTICATION,
            command: RX_COMMAND,
        }
    }
}

impl CharacteristicMap {
    /// Validate the characteristic map.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();

        for (field, uuid) in [
            ("characteristics.session_key", self.session_key),
            ("characteristics.authentication", self.authentication),
            ("characteristics.command", self.command),
        ] {
            if uuid.is_nil() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "UUID cannot be nil".to_string(),
                });
            } else if !seen.insert(uuid) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("duplicate characteristic UUID {}", uuid),
                });
            }
        }

        errors
    }
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `connect_timeout_secs` or `characteristics.command`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("halo")
        .join("config.toml")
}
