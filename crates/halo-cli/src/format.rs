//! Output formatting for CLI commands.

use anyhow::Result;
use serde::Serialize;

use halo_core::DiscoveredController;
use halo_core::{CommandFrame, RelayCommand};

// ============================================================================
// Frame formatting
// ============================================================================

#[derive(Serialize)]
struct FrameJson<'a> {
    gpo: u8,
    action: &'a str,
    action_code: u8,
    length: usize,
    frame: String,
}

pub fn format_frame_text(command: &RelayCommand, frame: &CommandFrame) -> String {
    format!("{}\n{}\n", command, frame)
}

pub fn format_frame_json(command: &RelayCommand, frame: &CommandFrame) -> Result<String> {
    let json = FrameJson {
        gpo: command.output,
        action: command.action.name(),
        action_code: command.action.code(),
        length: frame.as_bytes().len(),
        frame: frame.to_hex(),
    };
    Ok(serde_json::to_string_pretty(&json)? + "\n")
}

// ============================================================================
// Scan formatting
// ============================================================================

pub fn format_scan_text(controllers: &[DiscoveredController], show_tips: bool) -> String {
    if controllers.is_empty() {
        let mut out = String::from("No Halo controllers found.\n");
        if show_tips {
            out.push_str("\nMake sure:\n");
            out.push_str("  - The chlorinator is powered on and in range\n");
            out.push_str("  - Bluetooth is enabled on this computer\n");
            out.push_str("  - No phone app is connected to the controller\n");
        }
        return out;
    }

    let mut out = format!("Found {} device(s):\n\n", controllers.len());
    out.push_str(&format!("{:<24} {:<40} {:>8}\n", "NAME", "IDENTIFIER", "RSSI"));
    for controller in controllers {
        let rssi = controller
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!(
            "{:<24} {:<40} {:>8}\n",
            controller.name.as_deref().unwrap_or("Unknown"),
            controller.identifier,
            rssi
        ));
    }
    if show_tips {
        out.push_str("\nTip: run `halo config init --device <IDENTIFIER>` to save one.\n");
    }
    out
}

pub fn format_scan_json(controllers: &[DiscoveredController]) -> Result<String> {
    #[derive(Serialize)]
    struct ScanResult<'a> {
        count: usize,
        devices: Vec<DeviceJson<'a>>,
    }

    #[derive(Serialize)]
    struct DeviceJson<'a> {
        name: Option<&'a str>,
        address: &'a str,
        identifier: &'a str,
        rssi: Option<i16>,
        is_halo: bool,
    }

    let result = ScanResult {
        count: controllers.len(),
        devices: controllers
            .iter()
            .map(|d| DeviceJson {
                name: d.name.as_deref(),
                address: &d.address,
                identifier: &d.identifier,
                rssi: d.rssi,
                is_halo: d.is_halo,
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&result)? + "\n")
}
