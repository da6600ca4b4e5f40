//! marmot configuration
//!
//! Shared environment variable names and the [`WorkingContext`] that every marmot
//! component receives explicitly instead of reading the process working directory.

pub mod constants;
pub mod context;

pub use context::{ConfigError, WorkingContext};
