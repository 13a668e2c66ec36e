//! Example: Scanning for Halo Controllers
//!
//! This example scans for AstralPool Halo chlorinators using Bluetooth Low
//! Energy and prints the identifier to put in the `device` config field.
//!
//! Run with: `cargo run --example scan_controllers`

use std::time::Duration;

use halo_core::scan::{self, ScanOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("Scanning for Halo controllers...");
    println!();

    let options = ScanOptions::default().duration(Duration::from_secs(10));
    let controllers = scan::scan_with_options(options).await?;

    if controllers.is_empty() {
        println!("No Halo controllers found.");
        println!();
        println!("Make sure:");
        println!("  - The chlorinator is powered on");
        println!("  - Bluetooth is enabled on this computer");
        println!("  - No phone app is currently connected to the controller");
    } else {
        println!("Found {} controller(s):", controllers.len());
        println!();

        for controller in &controllers {
            let name = controller.name.as_deref().unwrap_or("Unknown");
            let rssi = controller
                .rssi
                .map(|r| format!("{} dBm", r))
                .unwrap_or_else(|| "N/A".to_string());

            println!("  {}", name);
            println!("    Identifier: {}", controller.identifier);
            println!("    RSSI: {}", rssi);
            println!();
        }
    }

    Ok(())
}
