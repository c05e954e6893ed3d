//! Component removal

use log::{info, warn};

use super::Transform;
use crate::document;
use crate::error::Result;
use crate::store::DocumentStore;

/// Remove every document whose `metadata.name` equals `name` or whose `kind`
/// equals `kind`, across all categories.
///
/// Either condition alone is enough: `RemoveComponent::new("jaeger",
/// "DaemonSet")` drops every DaemonSet as well as every document named
/// `jaeger`.
#[derive(Debug, Clone)]
pub struct RemoveComponent {
    name: String,
    kind: String,
}

impl RemoveComponent {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl Transform for RemoveComponent {
    fn name(&self) -> &str {
        "remove-component"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let removed = store.remove_where(|doc| {
            document::name(doc) == Some(self.name.as_str())
                || document::kind(doc) == Some(self.kind.as_str())
        });
        if removed == 0 {
            warn!(
                "remove-component: nothing named '{}' or of kind '{}'",
                self.name, self.kind
            );
        } else {
            info!("Removed {} documents", removed);
        }
        Ok(())
    }
}
