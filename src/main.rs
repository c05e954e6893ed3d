//! # Manifest Customizer CLI
//!
//! This is the binary entry point for the `manifest-customizer` command-line
//! tool.
//!
//! Its responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging and terminal output.
//! - Running the selected command and reporting top-level errors.
//!
//! The customization logic lives in the library crate; the binary is a thin
//! wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
