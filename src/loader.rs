//! Populating a document store from manifest directories
//!
//! Each directory is walked recursively in file-name order. `.yaml` and
//! `.yml` files may hold several documents; `.json` files hold one. Every
//! document is placed in the category named by its `kind`. A file holding a
//! document of unknown kind is reported once as unrecognized; its other
//! documents are still loaded. Files with other extensions are skipped.

use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::category::Category;
use crate::document::{self, Document};
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// Load every manifest directory, in order, into a new store.
pub fn load_directories<P: AsRef<Path>>(directories: &[P]) -> Result<DocumentStore> {
    let mut store = DocumentStore::new();
    for dir in directories {
        load_directory(&mut store, dir.as_ref())?;
    }
    Ok(store)
}

/// Load one manifest directory into `store`.
pub fn load_directory(store: &mut DocumentStore, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::Load {
            path: dir.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Load {
            path: dir.display().to_string(),
            message: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        load_file(store, entry.path())?;
    }
    Ok(())
}

/// Load one manifest file into `store`. Returns the number of documents
/// placed in a category.
pub fn load_file(store: &mut DocumentStore, path: &Path) -> Result<usize> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let documents = match extension {
        "yaml" | "yml" => parse_yaml(path)?,
        "json" => parse_json(path)?,
        _ => {
            debug!("Skipping {}", path.display());
            return Ok(0);
        }
    };

    let identifier = path.to_string_lossy().into_owned();
    let mut classified = 0;
    let mut unrecognized = false;
    for doc in documents {
        match document::kind(&doc).and_then(Category::from_kind) {
            Some(category) => {
                store.append(category, identifier.clone(), doc);
                classified += 1;
            }
            None => unrecognized = true,
        }
    }
    if unrecognized {
        warn!("Unrecognized resource in {}", identifier);
        store.append_unrecognized(identifier);
    }
    Ok(classified)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| load_error(path, err))
}

fn load_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Load {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn parse_yaml(path: &Path) -> Result<Vec<Document>> {
    let content = read(path)?;
    let mut documents = Vec::new();
    for de in serde_yaml::Deserializer::from_str(&content) {
        let doc = Document::deserialize(de).map_err(|err| load_error(path, err))?;
        // Empty documents between separators
        if !doc.is_null() {
            documents.push(doc);
        }
    }
    Ok(documents)
}

fn parse_json(path: &Path) -> Result<Vec<Document>> {
    let content = read(path)?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|err| load_error(path, err))?;
    let doc = serde_yaml::to_value(json).map_err(|err| load_error(path, err))?;
    Ok(vec![doc])
}
