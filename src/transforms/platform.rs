//! Cloud platform storage

use std::path::{Path, PathBuf};

use log::info;
use serde_yaml::Value;

use super::{read_template, strip_container_resources, Transform};
use crate::category::Category;
use crate::config::PlatformBase;
use crate::error::Result;
use crate::merge::merge;
use crate::store::DocumentStore;

/// Identifier the platform StorageClass is stored under
pub const STORAGE_CLASS_IDENTIFIER: &str = "sourcegraph.StorageClass.yaml";

/// Add the StorageClass template for a platform, optionally patched.
///
/// On `minikube` every Deployment and StatefulSet container also loses its
/// `resources` block, since a single-node cluster cannot satisfy production
/// requests.
#[derive(Debug, Clone)]
pub struct Platform {
    base: PlatformBase,
    template: PathBuf,
    storage_class: Option<Value>,
}

impl Platform {
    pub fn new(base: PlatformBase, template_directory: &Path, storage_class: Option<Value>) -> Self {
        Self {
            base,
            template: template_directory.join(format!("{}.StorageClass.yaml", base.as_str())),
            storage_class,
        }
    }
}

impl Transform for Platform {
    fn name(&self) -> &str {
        "platform"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let mut storage_class = read_template(&self.template)?;
        if let Some(patch) = &self.storage_class {
            merge(&mut storage_class, patch);
        }
        store.append(Category::StorageClasses, STORAGE_CLASS_IDENTIFIER, storage_class);

        if self.base == PlatformBase::Minikube {
            info!("minikube: removing container resource requirements");
            strip_container_resources(store);
        }
        Ok(())
    }
}
