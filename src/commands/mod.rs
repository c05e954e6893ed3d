//! # CLI Command Implementations
//!
//! Each subcommand of `manifest-customizer` lives in its own file with:
//! - An `Args` struct deriving `clap::Args`.
//! - An `execute` function taking the parsed args and the shared console,
//!   calling into the `manifest_customizer` library.

pub mod apply;
pub mod validate;

use std::path::PathBuf;

use manifest_customizer::config::DEFAULT_CONFIG_FILE;

/// The config path to use when none was given
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
