use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod format;
mod util;

use cli::{Cli, Commands};
use commands::{cmd_config, cmd_encode, cmd_scan};
use util::config_path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "halo", &mut io::stdout());
        return Ok(());
    }

    // Initialize tracing
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let output = cli.output.as_ref();

    match cli.command {
        Commands::Encode {
            gpo,
            action,
            format,
        } => cmd_encode(gpo, &action, format, output)?,
        Commands::Scan {
            timeout,
            all,
            format,
        } => cmd_scan(timeout, all, format, output, cli.quiet).await?,
        Commands::Config { action } => {
            let path = config_path(cli.config.as_deref());
            cmd_config(action, &path, output)?
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
