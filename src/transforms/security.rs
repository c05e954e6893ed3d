//! Non-root and non-privileged pod security

use log::debug;
use serde_yaml::{Mapping, Value};

use super::{for_each_workload, mapping, Transform};
use crate::document::{self, Document};
use crate::error::Result;
use crate::merge::merge;
use crate::store::DocumentStore;

/// User and group a workload or container runs as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunAs {
    pub user: Option<u32>,
    pub group: Option<u32>,
}

impl RunAs {
    const fn new(user: Option<u32>, group: Option<u32>) -> Self {
        Self { user, group }
    }

    fn to_mapping(self) -> Mapping {
        let mut map = Mapping::new();
        if let Some(user) = self.user {
            map.insert(Value::from("runAsUser"), Value::from(user));
        }
        if let Some(group) = self.group {
            map.insert(Value::from("runAsGroup"), Value::from(group));
        }
        map
    }
}

/// Security overrides for one workload.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadOverride {
    pub workload: &'static str,
    /// Pod-level override, also applied to every container.
    pub pod: RunAs,
    /// Per-container overrides, applied last.
    pub containers: &'static [(&'static str, RunAs)],
}

/// Workloads whose images expect a specific user.
pub const WORKLOAD_OVERRIDES: &[WorkloadOverride] = &[
    WorkloadOverride {
        workload: "codeinsights-db",
        pod: RunAs::new(Some(70), None),
        containers: &[("timescaledb", RunAs::new(Some(70), Some(70)))],
    },
    WorkloadOverride {
        workload: "codeintel-db",
        pod: RunAs::new(Some(999), Some(999)),
        containers: &[],
    },
    WorkloadOverride {
        workload: "grafana",
        pod: RunAs::new(None, None),
        containers: &[("grafana", RunAs::new(Some(472), Some(472)))],
    },
    WorkloadOverride {
        workload: "pgsql",
        pod: RunAs::new(Some(999), Some(999)),
        containers: &[],
    },
    WorkloadOverride {
        workload: "redis-cache",
        pod: RunAs::new(Some(999), Some(1000)),
        containers: &[],
    },
    WorkloadOverride {
        workload: "redis-store",
        pod: RunAs::new(Some(999), Some(1000)),
        containers: &[],
    },
];

/// Defaults for every container.
const DEFAULT_RUN_AS: RunAs = RunAs::new(Some(100), Some(101));

/// Run every Deployment and StatefulSet container as an unprivileged user.
///
/// Each container's `securityContext` is replaced with
/// `allowPrivilegeEscalation: false` plus a user and group: `100:101` by
/// default, overridden first by the workload entry in [`WORKLOAD_OVERRIDES`]
/// and then by its container entry. Workloads with an entry also get a pod
/// level `securityContext` merged in.
#[derive(Debug, Clone)]
pub struct NonRoot {
    name: &'static str,
}

impl NonRoot {
    pub fn new() -> Self {
        Self { name: "non-root" }
    }

    /// Non-privileged currently implies exactly non-root.
    pub fn non_privileged() -> Self {
        Self {
            name: "non-privileged",
        }
    }
}

impl Default for NonRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for NonRoot {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        for_each_workload(store, secure_workload);
        Ok(())
    }
}

fn secure_workload(doc: &mut Document) {
    let Some(workload) = document::name(doc).map(String::from) else {
        return;
    };
    let overrides = WORKLOAD_OVERRIDES.iter().find(|o| o.workload == workload);

    if let Some(o) = overrides {
        debug!("Applying pod security context for {}", workload);
        let patch = mapping([(
            "spec",
            mapping([(
                "template",
                mapping([(
                    "spec",
                    mapping([("securityContext", Value::Mapping(o.pod.to_mapping()))]),
                )]),
            )]),
        )]);
        merge(doc, &patch);
    }

    for container in document::containers_mut(doc) {
        let container_name = container
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut context = mapping([("allowPrivilegeEscalation", Value::Bool(false))]);
        merge(&mut context, &Value::Mapping(DEFAULT_RUN_AS.to_mapping()));
        if let Some(o) = overrides {
            merge(&mut context, &Value::Mapping(o.pod.to_mapping()));
            if let Some((_, run_as)) = o.containers.iter().find(|(name, _)| *name == container_name) {
                merge(&mut context, &Value::Mapping(run_as.to_mapping()));
            }
        }
        document::ensure_mapping(container).insert(Value::from("securityContext"), context);
    }
}
