//! Container resource requirements

use log::{debug, warn};
use serde_yaml::Value;

use super::{for_each_workload, Transform};
use crate::document;
use crate::error::Result;
use crate::merge::merge;
use crate::store::DocumentStore;

/// Merge a partial `resources` block into every Deployment and StatefulSet
/// container whose name is listed. Init containers are not touched.
#[derive(Debug, Clone)]
pub struct SetResources {
    containers: Vec<String>,
    resources: Value,
}

impl SetResources {
    pub fn new(containers: Vec<String>, resources: Value) -> Self {
        Self {
            containers,
            resources,
        }
    }
}

impl Transform for SetResources {
    fn name(&self) -> &str {
        "set-resources"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let mut updated = 0;
        for_each_workload(store, |doc| {
            for container in document::containers_mut(doc) {
                let listed = container
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| self.containers.iter().any(|c| c == name));
                if listed {
                    debug!("Setting resources on container {:?}", container.get("name"));
                    merge(document::path_entry(container, &["resources"]), &self.resources);
                    updated += 1;
                }
            }
        });
        if updated == 0 {
            warn!("set-resources: no containers named {:?}", self.containers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_set_resources_merges_into_listed_containers() {
        let mut store = DocumentStore::new();
        store.append(
            Category::Deployments,
            "frontend.Deployment.yaml",
            yaml(
                r#"
kind: Deployment
metadata: {name: frontend}
spec:
  template:
    spec:
      initContainers:
        - name: frontend
      containers:
        - name: frontend
          resources: {limits: {cpu: "2", memory: 4G}}
        - name: jaeger-agent
"#,
            ),
        );
        store.append(
            Category::StatefulSets,
            "gitserver.StatefulSet.yaml",
            yaml(
                r#"
kind: StatefulSet
metadata: {name: gitserver}
spec:
  template:
    spec:
      containers:
        - name: gitserver
"#,
            ),
        );

        SetResources::new(
            vec!["frontend".to_string(), "gitserver".to_string()],
            yaml("limits: {cpu: \"4\"}"),
        )
        .apply(&mut store)
        .unwrap();

        let dep = &store.category(Category::Deployments)[0].document;
        let pod = &dep["spec"]["template"]["spec"];
        assert_eq!(pod["containers"][0]["resources"]["limits"]["cpu"].as_str(), Some("4"));
        assert_eq!(pod["containers"][0]["resources"]["limits"]["memory"].as_str(), Some("4G"));
        assert!(pod["containers"][1].get("resources").is_none());
        assert!(pod["initContainers"][0].get("resources").is_none());

        let ss = &store.category(Category::StatefulSets)[0].document;
        assert_eq!(
            ss["spec"]["template"]["spec"]["containers"][0]["resources"]["limits"]["cpu"].as_str(),
            Some("4")
        );
    }
}
