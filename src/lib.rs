//! # Manifest Customizer Library
//!
//! This library customizes a set of Kubernetes resource manifests before they
//! are deployed. A run loads base manifests into a categorized in-memory
//! store, applies an ordered list of transformations to it, and writes the
//! result along with any raw files and operator instructions the
//! transformations produced. It backs the `manifest-customizer` command-line
//! tool and can be embedded directly.
//!
//! ## Quick Example
//!
//! ```
//! use manifest_customizer::category::Category;
//! use manifest_customizer::pipeline::Pipeline;
//! use manifest_customizer::selector::Selector;
//! use manifest_customizer::store::DocumentStore;
//! use manifest_customizer::transforms::metadata::SetMetadata;
//! use manifest_customizer::transforms::overlay::Overlay;
//!
//! let mut store = DocumentStore::new();
//! store.append(
//!     Category::Deployments,
//!     "frontend.Deployment.yaml",
//!     serde_yaml::from_str("kind: Deployment\nmetadata: {name: frontend}\nspec: {replicas: 1}").unwrap(),
//! );
//!
//! let pipeline = Pipeline::new()
//!     .with(SetMetadata::set_namespace(Selector::any(), "prod"))
//!     .with(
//!         Overlay::new("frontend")
//!             .patch(Category::Deployments, serde_yaml::from_str("spec: {replicas: 3}").unwrap())
//!             .unwrap(),
//!     );
//! pipeline.run(&mut store).unwrap();
//!
//! let doc = &store.category(Category::Deployments)[0].document;
//! assert_eq!(doc["metadata"]["namespace"].as_str(), Some("prod"));
//! assert_eq!(doc["spec"]["replicas"].as_u64(), Some(3));
//! ```
//!
//! ## Core Concepts
//!
//! - **Store (`store`, `category`)**: one ordered list of documents per fixed
//!   resource category, plus raw files, unrecognized inputs and manual
//!   instructions.
//! - **Selection (`selector`)**: matching documents by name and kind.
//! - **Merging (`merge`)**: deep overlay of partial documents, with lists of
//!   named elements merged by name, and explicit field removal.
//! - **Transforms (`transforms`, `pipeline`)**: named mutations of the store,
//!   applied in order and stopping at the first failure.
//! - **Configuration (`config`)**: the YAML run configuration.
//!
//! ## Execution Flow
//!
//! [`customize::execute`] builds every configured transform, loads the
//! manifest directories (`loader`), runs the pipeline and, only if every
//! transform succeeded, writes the output (`writer`).

pub mod category;
pub mod config;
pub mod customize;
pub mod document;
pub mod error;
pub mod loader;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod selector;
pub mod store;
pub mod transforms;
pub mod writer;

#[cfg(test)]
mod merge_proptest;
