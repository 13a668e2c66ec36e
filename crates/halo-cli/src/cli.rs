//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "halo")]
#[command(author, version, about = "CLI for AstralPool Halo relay outputs", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "HALO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the command frame for a relay action
    Encode {
        /// Relay output number (1 to 4)
        #[arg(short = 'n', long, value_name = "N")]
        gpo: u8,

        /// Action: off, auto, on or noaction
        #[arg(short, long)]
        action: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Scan for nearby Halo controllers
    Scan {
        /// Scan timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// List every BLE peripheral, not just Halo controllers
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage the controller configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,

    /// Show the current configuration (access code redacted)
    Show,

    /// Write a new configuration file
    Init {
        /// Device name or address
        #[arg(short, long, env = "HALO_DEVICE")]
        device: Option<String>,

        /// Device access code
        #[arg(short, long)]
        access_code: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode() {
        let cli =
            Cli::try_parse_from(["halo", "encode", "--gpo", "2", "--action", "auto"]).unwrap();
        match cli.command {
            Commands::Encode {
                gpo,
                action,
                format,
            } => {
                assert_eq!(gpo, 2);
                assert_eq!(action, "auto");
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from([
            "halo",
            "--config",
            "/tmp/halo.toml",
            "config",
            "init",
            "--device",
            "HCHLOR-1A2B3C",
            "--access-code",
            "1234",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/halo.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: false, .. }
            }
        ));
    }

    #[test]
    fn test_encode_requires_action() {
        assert!(Cli::try_parse_from(["halo", "encode", "--gpo", "1"]).is_err());
    }
}
