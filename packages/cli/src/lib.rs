//! marmot command-line support
//!
//! Logging setup and terminal rendering shared by the `marmot` binary.

pub mod logging;
pub mod output;

pub use logging::init_tracing;

/// Version information for the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
