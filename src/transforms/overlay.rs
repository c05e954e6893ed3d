//! Per-kind overlay of named documents

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_yaml::Value;

use super::Transform;
use crate::category::Category;
use crate::config::OverlayOp;
use crate::document;
use crate::error::{Error, Result};
use crate::merge::{merge, parse_path, unset, FieldPath};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Default)]
struct KindOverlay {
    patch: Option<Value>,
    unset: Vec<FieldPath>,
}

/// Merge a patch into, then unset paths from, every document of a mergeable
/// category whose `metadata.name` equals the configured name exactly.
#[derive(Debug, Clone)]
pub struct Overlay {
    name: String,
    kinds: BTreeMap<Category, KindOverlay>,
}

impl Overlay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kinds: BTreeMap::new(),
        }
    }

    /// Set the patch for a category. Only mergeable categories are accepted.
    pub fn patch(mut self, category: Category, patch: Value) -> Result<Self> {
        self.kind_mut(category)?.patch = Some(patch);
        Ok(self)
    }

    /// Add paths to unset for a category after merging.
    pub fn unset(mut self, category: Category, paths: Vec<FieldPath>) -> Result<Self> {
        self.kind_mut(category)?.unset.extend(paths);
        Ok(self)
    }

    pub fn from_op(op: &OverlayOp) -> Result<Self> {
        let mut overlay = Overlay::new(&op.name);
        for category in Category::MERGEABLE {
            if let Some(patch) = op.patch_for(category) {
                overlay = overlay.patch(category, patch.clone())?;
            }
            let paths = op.unset.for_category(category);
            if !paths.is_empty() {
                overlay = overlay.unset(category, paths.iter().map(|p| parse_path(p)).collect())?;
            }
        }
        Ok(overlay)
    }

    fn kind_mut(&mut self, category: Category) -> Result<&mut KindOverlay> {
        if !Category::MERGEABLE.contains(&category) {
            return Err(Error::config(format!(
                "overlay: {} cannot be overlaid",
                category
            )));
        }
        Ok(self.kinds.entry(category).or_default())
    }
}

impl Transform for Overlay {
    fn name(&self) -> &str {
        "overlay"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let mut matched = 0;
        for (category, kind) in &self.kinds {
            for doc in store.documents_mut(*category) {
                if document::name(doc) != Some(self.name.as_str()) {
                    continue;
                }
                debug!("Overlaying {} {}", category.kind(), self.name);
                if let Some(patch) = &kind.patch {
                    merge(doc, patch);
                }
                unset(doc, &kind.unset);
                matched += 1;
            }
        }
        if matched == 0 && !self.kinds.is_empty() {
            warn!("overlay: no documents named '{}'", self.name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_transformations;
    use crate::config::Transformation;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn store() -> DocumentStore {
        let mut store = DocumentStore::new();
        store.append(
            Category::Deployments,
            "frontend.Deployment.yaml",
            yaml(
                r#"
kind: Deployment
metadata: {name: frontend}
spec:
  replicas: 1
  template:
    spec:
      containers:
        - name: frontend
          image: frontend:1
          resources: {limits: {cpu: "2"}}
        - name: jaeger-agent
          image: jaeger:1
"#,
            ),
        );
        store.append(
            Category::Deployments,
            "searcher.Deployment.yaml",
            yaml("kind: Deployment\nmetadata: {name: searcher}\nspec: {replicas: 1}"),
        );
        store.append(
            Category::Services,
            "frontend.Service.yaml",
            yaml("kind: Service\nmetadata: {name: frontend}\nspec: {type: ClusterIP}"),
        );
        store.append(
            Category::DaemonSets,
            "frontend.DaemonSet.yaml",
            yaml("kind: DaemonSet\nmetadata: {name: frontend}\nspec: {replicas: 1}"),
        );
        store
    }

    fn overlay_from(config: &str) -> Overlay {
        match parse_transformations(config).unwrap().remove(0) {
            Transformation::Overlay { overlay } => Overlay::from_op(&overlay).unwrap(),
            other => panic!("Expected overlay, got {:?}", other),
        }
    }

    #[test]
    fn test_overlay_merges_containers_by_name() {
        let mut store = store();
        overlay_from(
            r#"
- overlay:
    name: frontend
    deployment:
      spec:
        replicas: 3
        template:
          spec:
            containers:
              - name: frontend
                image: frontend:2
"#,
        )
        .apply(&mut store)
        .unwrap();

        let doc = &store.category(Category::Deployments)[0].document;
        assert_eq!(doc["spec"]["replicas"].as_u64(), Some(3));
        let containers = doc["spec"]["template"]["spec"]["containers"].as_sequence().unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0]["image"].as_str(), Some("frontend:2"));
        assert_eq!(containers[0]["resources"]["limits"]["cpu"].as_str(), Some("2"));
        assert_eq!(containers[1]["image"].as_str(), Some("jaeger:1"));
    }

    #[test]
    fn test_overlay_exact_name_only() {
        let mut store = store();
        Overlay::new("searcher")
            .patch(Category::Deployments, yaml("spec: {replicas: 5}"))
            .unwrap()
            .apply(&mut store)
            .unwrap();
        let replicas: Vec<Option<u64>> = store
            .category(Category::Deployments)
            .iter()
            .map(|e| e.document["spec"]["replicas"].as_u64())
            .collect();
        assert_eq!(replicas, vec![Some(1), Some(5)]);
    }

    #[test]
    fn test_overlay_category_isolation() {
        let mut store = store();
        let before_service = store.category(Category::Services).to_vec();
        let before_daemonset = store.category(Category::DaemonSets).to_vec();
        Overlay::new("frontend")
            .patch(Category::Deployments, yaml("spec: {replicas: 4}"))
            .unwrap()
            .apply(&mut store)
            .unwrap();
        assert_eq!(store.category(Category::Services), before_service.as_slice());
        assert_eq!(store.category(Category::DaemonSets), before_daemonset.as_slice());
    }

    #[test]
    fn test_overlay_unset_after_merge() {
        let mut store = store();
        overlay_from(
            r#"
- overlay:
    name: frontend
    deployment: {spec: {replicas: 2}}
    unset:
      deployment: ["spec.template.spec.containers[0].resources"]
      service: ["spec.type"]
"#,
        )
        .apply(&mut store)
        .unwrap();
        let doc = &store.category(Category::Deployments)[0].document;
        assert!(doc["spec"]["template"]["spec"]["containers"][0]
            .get("resources")
            .is_none());
        let svc = &store.category(Category::Services)[0].document;
        assert!(svc["spec"].get("type").is_none());
    }

    #[test]
    fn test_rerunning_index_unset_changes_nothing() {
        let mut store = store();
        let overlay = Overlay::new("frontend")
            .unset(
                Category::Deployments,
                vec![parse_path("spec.template.spec.containers[0]")],
            )
            .unwrap();
        overlay.apply(&mut store).unwrap();
        let once = store.category(Category::Deployments).to_vec();
        overlay.apply(&mut store).unwrap();
        assert_eq!(store.category(Category::Deployments), once.as_slice());

        let containers = once[0].document["spec"]["template"]["spec"]["containers"]
            .as_sequence()
            .unwrap();
        assert_eq!(containers.len(), 2);
        assert!(containers[0].is_null());
        assert_eq!(containers[1]["name"].as_str(), Some("jaeger-agent"));
    }

    #[test]
    fn test_overlay_without_match_is_noop() {
        let mut store = store();
        let before: Vec<_> = store.all_documents().cloned().collect();
        Overlay::new("nonexistent")
            .patch(Category::Deployments, yaml("spec: {replicas: 9}"))
            .unwrap()
            .apply(&mut store)
            .unwrap();
        let after: Vec<_> = store.all_documents().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_overlay_rejects_unmergeable_category() {
        assert!(Overlay::new("x")
            .patch(Category::DaemonSets, yaml("{}"))
            .is_err());
    }
}
