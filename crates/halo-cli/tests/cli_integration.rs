//! CLI Integration Tests
//!
//! These tests run the `halo` binary and check its output. Commands that
//! need a Bluetooth adapter are marked with #[ignore].
//!
//! Run:
//! ```
//! cargo test --package halo-cli --test cli_integration
//! ```
//!
//! Run hardware tests:
//! ```
//! cargo test --package halo-cli --test cli_integration -- --ignored --nocapture
//! ```

use std::path::Path;
use std::process::{Command, Output};

/// Get path to the halo binary
fn get_binary_path() -> String {
    // Try release first, then debug
    let release_path = env!("CARGO_MANIFEST_DIR").to_string() + "/../../target/release/halo";
    let debug_path = env!("CARGO_MANIFEST_DIR").to_string() + "/../../target/debug/halo";

    if Path::new(&release_path).exists() {
        release_path
    } else if Path::new(&debug_path).exists() {
        debug_path
    } else {
        // Fall back to cargo run
        "cargo".to_string()
    }
}

/// Run halo command and return output
fn run_halo(args: &[&str]) -> Output {
    let binary = get_binary_path();

    let mut command = if binary == "cargo" {
        let mut command = Command::new("cargo");
        command.args(["run", "--quiet", "--package", "halo-cli", "--"]);
        command
    } else {
        Command::new(&binary)
    };

    command
        .args(args)
        .env_remove("HALO_CONFIG")
        .env_remove("HALO_DEVICE")
        .output()
        .expect("Failed to run halo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_halo(&["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = stdout(&output);
    assert!(stdout.contains("Halo"), "Help should mention Halo");
    for cmd in ["encode", "scan", "config", "completions"] {
        assert!(stdout.contains(cmd), "Help should list {} command", cmd);
    }
}

#[test]
fn test_version_command() {
    let output = run_halo(&["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains("halo"));
}

#[test]
fn test_subcommand_help() {
    for cmd in ["encode", "scan", "config", "completions"] {
        let output = run_halo(&[cmd, "--help"]);

        assert!(output.status.success(), "{} --help should succeed", cmd);
        assert!(!stdout(&output).is_empty(), "{} --help should produce output", cmd);
    }
}

#[test]
fn test_completions_bash() {
    let output = run_halo(&["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("halo"));
}

// =============================================================================
// Encode Command
// =============================================================================

#[test]
fn test_encode_text() {
    let output = run_halo(&["encode", "--gpo", "2", "--action", "auto"]);

    assert!(output.status.success(), "Encode should succeed");
    let stdout = stdout(&output);
    assert!(stdout.contains("GPO2 -> Auto"));
    assert!(stdout.contains("03f8010201000000000000000000000000000000"));
}

#[test]
fn test_encode_json() {
    let output = run_halo(&["encode", "-n", "1", "-a", "On", "--format", "json"]);

    assert!(output.status.success(), "Encode should succeed");
    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("Encode JSON should parse");
    assert_eq!(value["gpo"], 1);
    assert_eq!(value["action_code"], 3);
    assert_eq!(value["length"], 20);
    assert_eq!(value["frame"], "03f8010300000000000000000000000000000000");
}

#[test]
fn test_encode_rejects_out_of_range_output() {
    let output = run_halo(&["encode", "--gpo", "5", "--action", "on"]);

    assert!(!output.status.success(), "GPO5 should be rejected");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 to 4"), "Error should name the valid range");
}

#[test]
fn test_encode_rejects_unknown_action() {
    let output = run_halo(&["encode", "--gpo", "1", "--action", "turbo"]);

    assert!(!output.status.success());
}

// =============================================================================
// Config Commands (no device required)
// =============================================================================

#[test]
fn test_config_path() {
    let output = run_halo(&["config", "path"]);

    assert!(output.status.success(), "Config path should succeed");
    assert!(stdout(&output).contains("config.toml"), "Should show config path");
}

#[test]
fn test_config_path_honours_flag() {
    let output = run_halo(&["--config", "/tmp/custom-halo.toml", "config", "path"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "/tmp/custom-halo.toml");
}

#[test]
fn test_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    let output = run_halo(&[
        "--config",
        path,
        "config",
        "init",
        "--device",
        "HCHLOR-1A2B3C",
        "--access-code",
        "2468",
    ]);
    assert!(output.status.success(), "Config init should succeed");

    let output = run_halo(&["--config", path, "config", "show"]);
    assert!(output.status.success(), "Config show should succeed");
    let stdout = stdout(&output);
    assert!(stdout.contains("HCHLOR-1A2B3C"));
    assert!(!stdout.contains("2468"), "Access code must be redacted");

    let output = run_halo(&["--config", path, "config", "init"]);
    assert!(!output.status.success(), "Init should not overwrite without --force");
}

#[test]
fn test_config_show_missing_file_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let output = run_halo(&["--config", path.to_str().unwrap(), "config", "show"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("connect_timeout_secs = 10"));
}

// =============================================================================
// Hardware Tests (require a Bluetooth adapter)
// =============================================================================

#[test]
#[ignore = "requires BLE hardware"]
fn test_scan_json() {
    let output = run_halo(&["scan", "--timeout", "5", "--format", "json"]);

    assert!(output.status.success(), "Scan should succeed");
    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("Scan JSON should parse");
    assert!(value["count"].is_number());
}
