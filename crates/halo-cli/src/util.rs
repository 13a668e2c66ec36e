//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use halo_core::ControllerConfig;
use halo_core::config::default_config_path;

/// Resolve the configuration file path: explicit flag, else the default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path)
}

/// Load the configuration at `path`, or defaults if the file does not exist.
pub fn load_config(path: &Path) -> Result<ControllerConfig> {
    if !path.exists() {
        return Ok(ControllerConfig::default());
    }
    ControllerConfig::load_validated(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
