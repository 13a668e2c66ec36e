//! Command-line interface for AstralPool Halo relay outputs.
//!
//! The `halo` binary covers the parts of the relay protocol that need no
//! vendor cipher: encoding command frames, finding controllers, and managing
//! the shared configuration file.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `encode` | Print the 20-byte command frame for a GPO and action |
//! | `scan` | Scan for nearby Halo controllers |
//! | `config` | Show, locate or create the configuration file |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! The configuration lives in `~/.config/halo/config.toml` (or platform
//! equivalent) and is the same file `halo_core::ControllerConfig` loads.
//!
//! # Environment Variables
//!
//! - `HALO_CONFIG`: Configuration file path (overridden by `--config`)
//! - `HALO_DEVICE`: Device for `config init` (overridden by `--device`)
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! ```bash
//! halo encode --gpo 2 --action auto
//! halo scan --timeout 15 --format json
//! halo config init --device HCHLOR-1A2B3C --access-code 1234
//! ```

// Re-export core dependencies for convenience
pub use halo_core;
pub use halo_types;
