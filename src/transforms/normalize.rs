//! Cleanup of values that serialize badly

use super::{for_each_workload, Transform};
use crate::document;
use crate::error::Result;
use crate::store::DocumentStore;

/// Drop `env: null` from every workload container and init container.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl Transform for Normalize {
    fn name(&self) -> &str {
        "normalize"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        for_each_workload(store, |doc| {
            for container in document::all_containers_mut(doc) {
                if container.get("env").is_some_and(|env| env.is_null()) {
                    document::remove_key(container, "env");
                }
            }
        });
        Ok(())
    }
}
