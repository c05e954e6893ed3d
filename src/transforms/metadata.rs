//! Metadata and namespace assignment

use log::{debug, warn};
use serde_yaml::Value;

use super::Transform;
use crate::category::Category;
use crate::document;
use crate::error::{Error, Result};
use crate::merge::merge;
use crate::selector::Selector;
use crate::store::DocumentStore;

/// Merge a partial `metadata` block into every selected document.
///
/// When the block sets `namespace` and at least one document matched, role
/// binding subjects matching the same selector are moved to that namespace
/// too, so bindings keep pointing at the relocated accounts.
#[derive(Debug, Clone)]
pub struct SetMetadata {
    name: &'static str,
    selector: Selector,
    metadata: Value,
}

impl SetMetadata {
    /// `metadata` must be a mapping.
    pub fn new(selector: Selector, metadata: Value) -> Result<Self> {
        if !metadata.is_mapping() {
            return Err(Error::config("set-metadata: 'metadata' must be a mapping"));
        }
        Ok(Self {
            name: "set-metadata",
            selector,
            metadata,
        })
    }

    /// Set only `metadata.namespace`.
    pub fn set_namespace(selector: Selector, namespace: &str) -> Self {
        Self {
            name: "set-namespace",
            selector,
            metadata: super::mapping([("namespace", Value::from(namespace))]),
        }
    }

    fn namespace(&self) -> Option<&Value> {
        self.metadata.get("namespace").filter(|ns| !ns.is_null())
    }

    fn propagate_to_subjects(&self, store: &mut DocumentStore, namespace: &Value) {
        for category in [Category::ClusterRoleBindings, Category::RoleBindings] {
            for binding in store.documents_mut(category) {
                let Some(Value::Sequence(subjects)) = binding.get_mut("subjects") else {
                    continue;
                };
                for subject in subjects.iter_mut() {
                    let selected = self.selector.matches_pair(
                        subject.get("name").and_then(Value::as_str),
                        subject.get("kind").and_then(Value::as_str),
                    );
                    if selected {
                        document::ensure_mapping(subject)
                            .insert(Value::from("namespace"), namespace.clone());
                    }
                }
            }
        }
    }
}

impl Transform for SetMetadata {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let selected = store.select_where(&self.selector);
        let matched = selected.len();
        for doc in selected {
            debug!("Merging metadata into {}", describe(doc));
            merge(document::path_entry(doc, &["metadata"]), &self.metadata);
        }

        if matched == 0 {
            warn!("{}: no documents match {}", self.name, self.selector);
            return Ok(());
        }

        if let Some(namespace) = self.namespace() {
            self.propagate_to_subjects(store, namespace);
        }
        Ok(())
    }
}

fn describe(doc: &Value) -> String {
    format!(
        "{}/{}",
        document::kind(doc).unwrap_or("?"),
        document::name(doc).unwrap_or("?")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Match;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn store() -> DocumentStore {
        let mut store = DocumentStore::new();
        store.append(
            Category::Deployments,
            "frontend.Deployment.yaml",
            yaml("kind: Deployment\nmetadata: {name: frontend, labels: {app: frontend}}"),
        );
        store.append(
            Category::ServiceAccounts,
            "frontend.ServiceAccount.yaml",
            yaml("kind: ServiceAccount\nmetadata: {name: frontend}"),
        );
        store.append(
            Category::ServiceAccounts,
            "default.ServiceAccount.yaml",
            yaml("kind: ServiceAccount\nmetadata: {name: default}"),
        );
        store.append(
            Category::RoleBindings,
            "frontend.RoleBinding.yaml",
            yaml(
                r#"
kind: RoleBinding
metadata: {name: frontend}
subjects:
  - {kind: ServiceAccount, name: frontend}
  - {kind: User, name: alice}
"#,
            ),
        );
        store.append(
            Category::ClusterRoleBindings,
            "prometheus.ClusterRoleBinding.yaml",
            yaml(
                r#"
kind: ClusterRoleBinding
metadata: {name: prometheus}
subjects:
  - {kind: ServiceAccount, name: prometheus, namespace: default}
"#,
            ),
        );
        store
    }

    fn namespaces(store: &DocumentStore) -> Vec<(String, Option<String>)> {
        store
            .all_documents()
            .map(|d| {
                (
                    document::name(d).unwrap_or_default().to_string(),
                    document::namespace(d).map(String::from),
                )
            })
            .collect()
    }

    #[test]
    fn test_set_namespace_everything() {
        let mut store = store();
        SetMetadata::set_namespace(Selector::any(), "prod")
            .apply(&mut store)
            .unwrap();
        assert!(store
            .all_documents()
            .all(|d| document::namespace(d) == Some("prod")));
        let rb = &store.category(Category::RoleBindings)[0].document;
        assert_eq!(rb["subjects"][0]["namespace"].as_str(), Some("prod"));
        assert_eq!(rb["subjects"][1]["namespace"].as_str(), Some("prod"));
    }

    #[test]
    fn test_namespace_propagates_only_to_matching_subjects() {
        let mut store = store();
        SetMetadata::set_namespace(Selector::new("frontend", "ServiceAccount"), "search")
            .apply(&mut store)
            .unwrap();

        let rb = &store.category(Category::RoleBindings)[0].document;
        assert_eq!(rb["subjects"][0]["namespace"].as_str(), Some("search"));
        assert!(rb["subjects"][1].get("namespace").is_none());

        let crb = &store.category(Category::ClusterRoleBindings)[0].document;
        assert_eq!(crb["subjects"][0]["namespace"].as_str(), Some("default"));

        // Only the selected service account moved.
        let accounts = store.category(Category::ServiceAccounts);
        assert_eq!(document::name(&accounts[0].document), Some("frontend"));
        assert_eq!(document::namespace(&accounts[0].document), Some("search"));
        assert_eq!(document::name(&accounts[1].document), Some("default"));
        assert_eq!(document::namespace(&accounts[1].document), None);
        let deployment = &store.category(Category::Deployments)[0].document;
        assert_eq!(document::namespace(deployment), None);
    }

    #[test]
    fn test_exclusion_leaves_pair_untouched() {
        let mut store = store();
        let selector = Selector::new(Match::Any, Match::Any)
            .excluding(vec![("default".to_string(), "ServiceAccount".to_string())]);
        SetMetadata::set_namespace(selector, "prod")
            .apply(&mut store)
            .unwrap();
        let untouched: Vec<String> = namespaces(&store)
            .into_iter()
            .filter(|(_, ns)| ns.is_none())
            .map(|(name, _)| name)
            .collect();
        assert_eq!(untouched, vec!["default"]);
    }

    #[test]
    fn test_no_match_skips_subject_propagation() {
        let mut store = store();
        SetMetadata::set_namespace(Selector::new("prometheus", "ServiceAccount"), "monitoring")
            .apply(&mut store)
            .unwrap();
        let crb = &store.category(Category::ClusterRoleBindings)[0].document;
        assert_eq!(crb["subjects"][0]["namespace"].as_str(), Some("default"));
    }

    #[test]
    fn test_set_metadata_merges_labels() {
        let mut store = store();
        SetMetadata::new(
            Selector::new("frontend", "Deployment"),
            yaml("labels: {deploy: sourcegraph}"),
        )
        .unwrap()
        .apply(&mut store)
        .unwrap();
        let doc = &store.category(Category::Deployments)[0].document;
        assert_eq!(doc["metadata"]["labels"]["app"].as_str(), Some("frontend"));
        assert_eq!(doc["metadata"]["labels"]["deploy"].as_str(), Some("sourcegraph"));
        // No namespace in the patch, so subjects are left alone.
        let rb = &store.category(Category::RoleBindings)[0].document;
        assert!(rb["subjects"][0].get("namespace").is_none());
    }

    #[test]
    fn test_set_metadata_creates_missing_metadata() {
        let mut store = DocumentStore::new();
        store.append(Category::Secrets, "s.yaml", yaml("kind: Secret"));
        SetMetadata::set_namespace(Selector::any(), "prod")
            .apply(&mut store)
            .unwrap();
        let doc = &store.category(Category::Secrets)[0].document;
        assert_eq!(document::namespace(doc), Some("prod"));
    }

    #[test]
    fn test_set_metadata_requires_mapping() {
        assert!(SetMetadata::new(Selector::any(), Value::from("prod")).is_err());
    }
}
