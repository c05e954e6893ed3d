//! End-to-end customization run
//!
//! Coordinates the pieces in order:
//! 1. Build every configured transform (configuration errors surface here)
//! 2. Load the manifest directories into a store
//! 3. Run the pipeline, stopping at the first failing transform
//! 4. Write the store, unless this is a dry run
//!
//! Output is only written after every transform succeeded.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::loader;
use crate::pipeline::Pipeline;
use crate::store::DocumentStore;
use crate::transforms::{self, BuildContext};
use crate::writer::{FilenameMapper, WriteSummary, Writer};

/// Per-run settings that are not part of the configuration file
#[derive(Default)]
pub struct RunOptions<'a> {
    /// Overrides the configured output directory.
    pub output_directory: Option<PathBuf>,
    /// Load and transform without writing anything.
    pub dry_run: bool,
    /// Overrides the default filename mapper.
    pub mapper: Option<&'a FilenameMapper>,
}

/// The result of a successful run
#[derive(Debug)]
pub struct RunReport {
    /// The customized store.
    pub store: DocumentStore,
    /// Where output went, or would have gone on a dry run.
    pub output_directory: PathBuf,
    /// `None` on a dry run.
    pub written: Option<WriteSummary>,
}

/// Build the pipeline for a configuration without running it.
pub fn build_pipeline(config: &RunConfig, ctx: &BuildContext) -> Result<Pipeline> {
    Ok(Pipeline::from(transforms::build_all(&config.transformations, ctx)?))
}

/// Run a configuration with transforms built from `ctx`.
pub fn execute(config: &RunConfig, ctx: &BuildContext, options: &RunOptions<'_>) -> Result<RunReport> {
    let pipeline = build_pipeline(config, ctx)?;
    execute_pipeline(config, &pipeline, options)
}

/// Run an already-built pipeline over the configured manifest directories.
pub fn execute_pipeline(
    config: &RunConfig,
    pipeline: &Pipeline,
    options: &RunOptions<'_>,
) -> Result<RunReport> {
    let directories = config.manifest_directories();
    let mut store = loader::load_directories(&directories)?;
    info!(
        "Loaded {} documents from {} directories",
        store.len(),
        directories.len()
    );
    for identifier in store.unrecognized() {
        warn!("Unrecognized input: {}", identifier);
    }

    pipeline.run(&mut store)?;

    let output_directory = options
        .output_directory
        .clone()
        .unwrap_or_else(|| config.output_directory.clone());

    let written = if options.dry_run {
        info!("Dry run: not writing to {}", output_directory.display());
        None
    } else {
        Some(write(&store, &output_directory, &directories, options.mapper)?)
    };

    Ok(RunReport {
        store,
        output_directory,
        written,
    })
}

fn write(
    store: &DocumentStore,
    output_directory: &Path,
    directories: &[&Path],
    mapper: Option<&FilenameMapper>,
) -> Result<WriteSummary> {
    let mut writer = Writer::new(output_directory, directories.to_vec());
    if let Some(mapper) = mapper {
        writer = writer.with_mapper(mapper);
    }
    writer.write(store)
}
