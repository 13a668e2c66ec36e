//! Command implementations.

mod config;
mod encode;
mod scan;

pub use config::cmd_config;
pub use encode::cmd_encode;
pub use scan::cmd_scan;
