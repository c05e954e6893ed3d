//! # Error Handling
//!
//! This module defines the centralized error type for the customizer. It uses
//! the `thiserror` library to build an `Error` enum covering every failure a
//! customization run can hit, with contextual fields for diagnostics.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failures. Each variant carries enough
//!   context (the transform, file path or URL involved) to explain itself.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Failures fall into three groups:
//!
//! - Configuration errors, raised while parsing the run configuration and
//!   constructing transforms, before the pipeline starts.
//! - Collaborator failures (template files, certificates, remote bundles),
//!   raised by the transform that performed the I/O.
//! - Loader and writer failures at either end of a run.
//!
//! Merge fallbacks and unsetting a missing path are not errors and have no
//! variant here.

use thiserror::Error;

/// Main error type for customization runs
#[derive(Error, Debug)]
pub enum Error {
    /// The run configuration could not be parsed or holds an invalid value.
    ///
    /// Carries an optional hint about how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A transform failed while mutating the document store.
    #[error("Transform '{transform}' failed: {message}")]
    Transform { transform: String, message: String },

    /// A template fragment could not be read or parsed.
    #[error("Template error: {path}: {message}")]
    Template { path: String, message: String },

    /// A remote manifest bundle could not be fetched.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// A manifest file could not be loaded into the store.
    #[error("Failed to load manifest {path}: {message}")]
    Load { path: String, message: String },

    /// An output file could not be written.
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a configuration error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            hint: None,
        }
    }

    /// Shorthand for a transform failure.
    pub fn transform(transform: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transform {
            transform: transform.into(),
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
