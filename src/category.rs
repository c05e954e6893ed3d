//! The closed set of resource categories held by the document store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A fixed bucket of documents sharing a resource kind.
///
/// Variants are declared in canonical order; iteration over the store and
/// flattened document views follow this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Deployments,
    PersistentVolumeClaims,
    PersistentVolumes,
    Services,
    ClusterRoles,
    ClusterRoleBindings,
    ConfigMaps,
    DaemonSets,
    Ingresses,
    PodSecurityPolicies,
    Roles,
    RoleBindings,
    ServiceAccounts,
    Secrets,
    StatefulSets,
    StorageClasses,
}

impl Category {
    /// Every category, in canonical order.
    pub const ALL: [Category; 16] = [
        Category::Deployments,
        Category::PersistentVolumeClaims,
        Category::PersistentVolumes,
        Category::Services,
        Category::ClusterRoles,
        Category::ClusterRoleBindings,
        Category::ConfigMaps,
        Category::DaemonSets,
        Category::Ingresses,
        Category::PodSecurityPolicies,
        Category::Roles,
        Category::RoleBindings,
        Category::ServiceAccounts,
        Category::Secrets,
        Category::StatefulSets,
        Category::StorageClasses,
    ];

    /// Categories whose documents are meaningful overlay targets.
    pub const MERGEABLE: [Category; 6] = [
        Category::Ingresses,
        Category::Deployments,
        Category::ConfigMaps,
        Category::StatefulSets,
        Category::PersistentVolumeClaims,
        Category::Services,
    ];

    /// The resource `kind` documents in this category conventionally carry.
    pub fn kind(self) -> &'static str {
        match self {
            Category::Deployments => "Deployment",
            Category::PersistentVolumeClaims => "PersistentVolumeClaim",
            Category::PersistentVolumes => "PersistentVolume",
            Category::Services => "Service",
            Category::ClusterRoles => "ClusterRole",
            Category::ClusterRoleBindings => "ClusterRoleBinding",
            Category::ConfigMaps => "ConfigMap",
            Category::DaemonSets => "DaemonSet",
            Category::Ingresses => "Ingress",
            Category::PodSecurityPolicies => "PodSecurityPolicy",
            Category::Roles => "Role",
            Category::RoleBindings => "RoleBinding",
            Category::ServiceAccounts => "ServiceAccount",
            Category::Secrets => "Secret",
            Category::StatefulSets => "StatefulSet",
            Category::StorageClasses => "StorageClass",
        }
    }

    /// Classify a resource `kind` into its category.
    pub fn from_kind(kind: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.kind() == kind)
    }

    /// Plural display name, e.g. `Deployments`.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Deployments => "Deployments",
            Category::PersistentVolumeClaims => "PersistentVolumeClaims",
            Category::PersistentVolumes => "PersistentVolumes",
            Category::Services => "Services",
            Category::ClusterRoles => "ClusterRoles",
            Category::ClusterRoleBindings => "ClusterRoleBindings",
            Category::ConfigMaps => "ConfigMaps",
            Category::DaemonSets => "DaemonSets",
            Category::Ingresses => "Ingresses",
            Category::PodSecurityPolicies => "PodSecurityPolicies",
            Category::Roles => "Roles",
            Category::RoleBindings => "RoleBindings",
            Category::ServiceAccounts => "ServiceAccounts",
            Category::Secrets => "Secrets",
            Category::StatefulSets => "StatefulSets",
            Category::StorageClasses => "StorageClasses",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts either the plural category name or the singular kind.
    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.kind() == s)
            .ok_or_else(|| Error::config(format!("Unknown resource category: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind_round_trips_every_category() {
        for category in Category::ALL {
            assert_eq!(Category::from_kind(category.kind()), Some(category));
        }
    }

    #[test]
    fn test_from_kind_unknown() {
        assert_eq!(Category::from_kind("Namespace"), None);
        assert_eq!(Category::from_kind("deployment"), None);
    }

    #[test]
    fn test_from_str_accepts_plural_and_kind() {
        assert_eq!("Ingresses".parse::<Category>().unwrap(), Category::Ingresses);
        assert_eq!("Ingress".parse::<Category>().unwrap(), Category::Ingresses);
        assert!("Ingresss".parse::<Category>().is_err());
    }

    #[test]
    fn test_canonical_order_matches_ord() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }

    #[test]
    fn test_mergeable_subset() {
        assert!(Category::MERGEABLE.contains(&Category::Deployments));
        assert!(!Category::MERGEABLE.contains(&Category::Secrets));
        assert!(!Category::MERGEABLE.contains(&Category::RoleBindings));
    }
}
