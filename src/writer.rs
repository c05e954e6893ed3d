//! Serializing a finished document store
//!
//! Every entry is written as YAML to the path the filename mapper derives
//! from its identifier, relative to the output directory. Entries mapped to
//! the same path share one multi-document file, in store order. Store order
//! is canonical category order, so a loaded file that mixed kinds is
//! rewritten grouped by category rather than in its original document
//! order. Within one category, documents keep their relative order. Raw files
//! are written verbatim and manual instructions go to `INSTRUCTIONS.md`.
//!
//! Parent directories are created as needed and existing files are
//! overwritten.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// File manual instructions are written to
pub const INSTRUCTIONS_FILE: &str = "INSTRUCTIONS.md";

/// Maps `(manifest directory, identifier)` to an output-relative path.
pub type FilenameMapper = dyn Fn(&Path, &str) -> PathBuf;

/// The identifier's path relative to the manifest directory it came from.
/// Identifiers outside that directory are used as-is.
pub fn default_filename_mapper(source_directory: &Path, identifier: &str) -> PathBuf {
    let path = Path::new(identifier);
    path.strip_prefix(source_directory)
        .unwrap_or(path)
        .to_path_buf()
}

/// What a write produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Manifest files written, relative to the output directory.
    pub manifests: Vec<PathBuf>,
    /// Raw files written.
    pub raw_files: usize,
    /// Whether `INSTRUCTIONS.md` was written.
    pub instructions: bool,
}

/// Writes a store under an output directory
pub struct Writer<'a> {
    output_directory: &'a Path,
    manifest_directories: Vec<&'a Path>,
    mapper: &'a FilenameMapper,
}

impl<'a> Writer<'a> {
    /// `manifest_directories` decide which directory is passed to the mapper
    /// for each identifier; the first one is the fallback.
    pub fn new(output_directory: &'a Path, manifest_directories: Vec<&'a Path>) -> Self {
        Self {
            output_directory,
            manifest_directories,
            mapper: &default_filename_mapper,
        }
    }

    pub fn with_mapper(mut self, mapper: &'a FilenameMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Output-relative path for an identifier
    pub fn output_path(&self, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        let source = self
            .manifest_directories
            .iter()
            .find(|dir| path.starts_with(dir))
            .or_else(|| self.manifest_directories.first())
            .copied()
            .unwrap_or_else(|| Path::new(""));
        confine((self.mapper)(source, identifier))
    }

    pub fn write(&self, store: &DocumentStore) -> Result<WriteSummary> {
        let mut files: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
        for (_, entry) in store.entries() {
            let rendered = serde_yaml::to_string(&entry.document)?;
            files
                .entry(self.output_path(&entry.identifier))
                .or_default()
                .push(rendered);
        }

        let mut summary = WriteSummary::default();
        for (relative, docs) in files {
            self.write_file(&relative, &docs.join("---\n"))?;
            summary.manifests.push(relative);
        }

        for raw in store.raw_files() {
            self.write_file(&confine(PathBuf::from(&raw.filename)), &raw.content)?;
            summary.raw_files += 1;
        }

        if !store.manual_instructions().is_empty() {
            self.write_file(
                Path::new(INSTRUCTIONS_FILE),
                &render_instructions(store.manual_instructions()),
            )?;
            summary.instructions = true;
        }

        Ok(summary)
    }

    fn write_file(&self, relative: &Path, content: &str) -> Result<()> {
        let full_path = self.output_directory.join(relative);
        debug!("Writing {}", full_path.display());

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Write {
                path: parent.display().to_string(),
                message: format!("failed to create directory: {}", e),
            })?;
        }
        fs::write(&full_path, content).map_err(|e| Error::Write {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Keep only the normal components of a path so it cannot escape the
/// output directory.
fn confine(path: PathBuf) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Instructions as a markdown document, one section per instruction.
pub fn render_instructions(instructions: &[String]) -> String {
    let mut out = String::from("# Manual instructions\n");
    for instruction in instructions {
        out.push('\n');
        out.push_str(instruction.trim_end());
        out.push('\n');
    }
    out
}
