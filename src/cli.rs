//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use manifest_customizer::output::{ColorChoice, Console};

use crate::commands;

/// Manifest Customizer - Apply transformations to Kubernetes manifests
#[derive(Parser, Debug)]
#[command(name = "manifest-customizer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load manifests, apply the configured transformations and write the result
    Apply(commands::apply::ApplyArgs),

    /// Check a configuration file and list the transformations it defines
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let console = Console::new(self.color.into());

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args, &console),
            Commands::Validate(args) => commands::validate::execute(args, &console),
        }
    }
}

fn init_logging(level: &str) {
    // A logger may already be installed when running under a test harness.
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}
