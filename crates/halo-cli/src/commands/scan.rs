//! Scan command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use halo_core::ScanOptions;
use halo_core::scan::scan_with_options;

use crate::cli::OutputFormat;
use crate::format::{format_scan_json, format_scan_text};
use crate::util::write_output;

pub async fn cmd_scan(
    timeout: u64,
    all: bool,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
) -> Result<()> {
    if !quiet && matches!(format, OutputFormat::Text) {
        eprintln!("Scanning for Halo controllers ({}s)...", timeout);
    }

    let mut options = ScanOptions::new().duration(Duration::from_secs(timeout));
    if all {
        options = options.all_devices();
    }

    let controllers = scan_with_options(options)
        .await
        .context("Failed to scan for devices")?;

    let content = match format {
        OutputFormat::Text => format_scan_text(&controllers, !quiet),
        OutputFormat::Json => format_scan_json(&controllers)?,
    };
    write_output(output, &content)
}
