//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use halo_core::{AccessCode, ControllerConfig};
use tracing::info;

use crate::cli::ConfigAction;
use crate::util::{load_config, write_output};

pub fn cmd_config(action: ConfigAction, path: &Path, output: Option<&PathBuf>) -> Result<()> {
    match action {
        ConfigAction::Path => write_output(output, &format!("{}\n", path.display())),
        ConfigAction::Show => {
            let config = load_config(path)?;
            write_output(output, &render(&config)?)
        }
        ConfigAction::Init {
            device,
            access_code,
            force,
        } => init(path, device, access_code, force),
    }
}

fn init(
    path: &Path,
    device: Option<String>,
    access_code: Option<String>,
    force: bool,
) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = ControllerConfig::new(
        device.unwrap_or_default(),
        AccessCode::new(access_code.unwrap_or_default()),
    );
    config.save(path).context("Failed to write configuration")?;

    info!("Wrote configuration to {}", path.display());
    if config.device.is_empty() || config.access_code.is_empty() {
        eprintln!(
            "Note: set `device` and `access_code` in {} before sending commands",
            path.display()
        );
    }
    Ok(())
}

/// TOML rendering with the access code masked.
fn render(config: &ControllerConfig) -> Result<String> {
    let mut redacted = config.clone();
    if !redacted.access_code.is_empty() {
        redacted.access_code = AccessCode::from("****");
    }
    toml::to_string_pretty(&redacted).context("Failed to serialize configuration")
}
