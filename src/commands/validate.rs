//! # Validate Command Implementation
//!
//! Parses a run configuration and constructs every transformation it names
//! without loading or writing any manifests. Construction performs the same
//! checks as `apply` (unknown transforms, invalid options, bad bundle URLs),
//! so a configuration that validates will not fail before the pipeline runs.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use manifest_customizer::config;
use manifest_customizer::output::{Console, Status};
use manifest_customizer::transforms::{self, BuildContext};

/// Validate a run configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file to validate (defaults to customize.yaml)
    #[arg(short, long, value_name = "FILE", env = "MANIFEST_CUSTOMIZER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, console: &Console) -> Result<()> {
    let config_path = super::config_path(args.config);
    println!(
        "{}",
        console.line(
            Status::Info,
            format!("Validating configuration: {}", config_path.display())
        )
    );

    let run_config = match config::from_file(&config_path) {
        Ok(run_config) => run_config,
        Err(e) => {
            println!("{}", console.line(Status::Failed, "Configuration parsing failed"));
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    let ctx = BuildContext::new(run_config.template_directory.clone());
    let built = transforms::build_all(&run_config.transformations, &ctx);
    if let Err(e) = built {
        println!("{}", console.line(Status::Failed, "Transformation setup failed"));
        return Err(anyhow::anyhow!("Transformation setup failed: {}", e));
    }

    println!("{}", console.line(Status::Ok, "Configuration is valid"));
    println!();
    println!("{}", console.heading("Manifest directories"));
    for dir in run_config.manifest_directories() {
        println!("   {}", dir.display());
    }
    println!("{}", console.heading("Output directory"));
    println!("   {}", run_config.output_directory.display());
    println!(
        "{}",
        console.heading(&format!("Transformations ({})", run_config.transformations.len()))
    );
    for (idx, transformation) in run_config.transformations.iter().enumerate() {
        println!("   {}. {}", idx + 1, transformation.name());
    }

    Ok(())
}
