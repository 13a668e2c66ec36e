//! Encode command implementation.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use halo_core::{CommandFrame, RelayAction, RelayCommand};

use crate::cli::OutputFormat;
use crate::format::{format_frame_json, format_frame_text};
use crate::util::write_output;

/// Build the 20-byte frame for a relay action without touching the device.
pub fn cmd_encode(
    gpo: u8,
    action: &str,
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    let action = RelayAction::from_str(action)
        .with_context(|| format!("Invalid action '{}'", action))?;
    let command = RelayCommand::new(action, gpo).context("Invalid relay command")?;
    let frame = CommandFrame::encode(&command)?;

    let content = match format {
        OutputFormat::Text => format_frame_text(&command, &frame),
        OutputFormat::Json => format_frame_json(&command, &frame)?,
    };
    write_output(output, &content)
}
