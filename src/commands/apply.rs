//! Apply command implementation
//!
//! Runs a full customization:
//! 1. Parse the run configuration and build its transforms
//! 2. Load the manifest directories
//! 3. Apply the transforms in order
//! 4. Write the result (skipped on `--dry-run`)
//!
//! Manual instructions produced by the transforms are printed at the end.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use manifest_customizer::config;
use manifest_customizer::customize::{self, RunOptions};
use manifest_customizer::output::{Console, Status};
use manifest_customizer::transforms::BuildContext;

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to config file (defaults to customize.yaml)
    #[arg(short, long, value_name = "PATH", env = "MANIFEST_CUSTOMIZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory (overrides output-directory from the config)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Show what would be done without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, console: &Console) -> Result<()> {
    let start_time = Instant::now();
    let config_path = super::config_path(args.config);

    if !config_path.exists() {
        anyhow::bail!("Configuration file not found: {}", config_path.display());
    }

    if !args.quiet && args.dry_run {
        println!("{}", console.line(Status::Info, "Dry run: no files will be written"));
    }

    let run_config = config::from_file(&config_path)?;
    let ctx = BuildContext::new(run_config.template_directory.clone());
    let options = RunOptions {
        output_directory: args.output,
        dry_run: args.dry_run,
        mapper: None,
    };

    let report = match customize::execute(&run_config, &ctx, &options) {
        Ok(report) => report,
        Err(e) => {
            if !args.quiet {
                println!("{}", console.line(Status::Failed, "Customization failed"));
            }
            return Err(e.into());
        }
    };

    if args.quiet {
        return Ok(());
    }

    let store = &report.store;
    println!(
        "{}",
        console.line(
            Status::Ok,
            format!(
                "Applied {} transformations in {:.2}s",
                run_config.transformations.len(),
                start_time.elapsed().as_secs_f64()
            )
        )
    );
    println!("   {} documents", store.len());
    if let Some(summary) = &report.written {
        println!(
            "   {} manifest files, {} raw files written to {}",
            summary.manifests.len(),
            summary.raw_files,
            report.output_directory.display()
        );
    }
    for identifier in store.unrecognized() {
        println!(
            "{}",
            console.line(Status::Warning, format!("Unrecognized input: {}", identifier))
        );
    }

    if !store.manual_instructions().is_empty() {
        println!();
        println!("{}", console.heading("Manual instructions"));
        for instruction in store.manual_instructions() {
            println!();
            println!("{}", instruction.trim_end());
        }
    }

    Ok(())
}
