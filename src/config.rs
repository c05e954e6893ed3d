//! # Run Configuration Schema and Parsing
//!
//! This module defines the data structures that represent a customization
//! run configuration file (`customize.yaml` by default) and the logic for
//! parsing it.
//!
//! ## Key Components
//!
//! - **`RunConfig`**: source and output directories plus the ordered list of
//!   transformations.
//! - **`Transformation`**: an enum with one variant per transform. Each
//!   variant wraps an options struct (e.g. `OverlayOp`, `IngressOp`).
//!
//! ## Format
//!
//! ```yaml
//! source-directory: base
//! output-directory: generated
//! transformations:
//!   - set-namespace: { name: "*", kind: "*", namespace: prod }
//!   - overlay:
//!       name: frontend
//!       deployment: { spec: { replicas: 3 } }
//!   - normalize
//! ```
//!
//! Each transformation is a single-key mapping naming the transform (a bare
//! string is accepted for transforms without options). Keys are dispatched
//! explicitly so that an unknown transform or an invalid option value is
//! reported by name.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::category::Category;
use crate::error::{Error, Result};
use crate::selector::Match;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "customize.yaml";

/// Default directory holding template fragments
pub const DEFAULT_TEMPLATE_DIRECTORY: &str = "custom";

/// Names accepted as transformation keys
pub const TRANSFORMATION_NAMES: [&str; 11] = [
    "overlay",
    "set-metadata",
    "set-namespace",
    "remove-component",
    "set-resources",
    "platform",
    "ingress",
    "ssh-cloning",
    "non-root",
    "non-privileged",
    "normalize",
];

/// Ingress strategies accepted by the `ingress` transformation
pub const INGRESS_TYPES: [&str; 3] = ["NginxIngressController", "NginxNodePortService", "NodePort"];

/// Overlay configuration: patches and unset paths per mergeable kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OverlayOp {
    /// Exact `metadata.name` of the documents to patch.
    pub name: String,
    #[serde(default)]
    pub deployment: Option<Value>,
    #[serde(default)]
    pub stateful_set: Option<Value>,
    #[serde(default)]
    pub service: Option<Value>,
    #[serde(default)]
    pub config_map: Option<Value>,
    #[serde(default)]
    pub ingress: Option<Value>,
    #[serde(default)]
    pub persistent_volume_claim: Option<Value>,
    /// Paths deleted after merging, per kind.
    #[serde(default)]
    pub unset: UnsetPaths,
}

impl OverlayOp {
    /// The patch configured for a mergeable category.
    pub fn patch_for(&self, category: Category) -> Option<&Value> {
        match category {
            Category::Deployments => self.deployment.as_ref(),
            Category::StatefulSets => self.stateful_set.as_ref(),
            Category::Services => self.service.as_ref(),
            Category::ConfigMaps => self.config_map.as_ref(),
            Category::Ingresses => self.ingress.as_ref(),
            Category::PersistentVolumeClaims => self.persistent_volume_claim.as_ref(),
            _ => None,
        }
    }
}

/// Unset path strings per mergeable kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnsetPaths {
    #[serde(default)]
    pub deployment: Vec<String>,
    #[serde(default)]
    pub stateful_set: Vec<String>,
    #[serde(default)]
    pub service: Vec<String>,
    #[serde(default)]
    pub config_map: Vec<String>,
    #[serde(default)]
    pub ingress: Vec<String>,
    #[serde(default)]
    pub persistent_volume_claim: Vec<String>,
}

impl UnsetPaths {
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Deployments => &self.deployment,
            Category::StatefulSets => &self.stateful_set,
            Category::Services => &self.service,
            Category::ConfigMaps => &self.config_map,
            Category::Ingresses => &self.ingress,
            Category::PersistentVolumeClaims => &self.persistent_volume_claim,
            _ => &[],
        }
    }
}

/// Metadata merge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SetMetadataOp {
    pub name: Match,
    pub kind: Match,
    /// Partial `metadata` merged into each selected document.
    pub metadata: Value,
    /// `[name, kind]` pairs left untouched.
    #[serde(default)]
    pub omit: Vec<(String, String)>,
}

/// Namespace assignment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SetNamespaceOp {
    pub name: Match,
    pub kind: Match,
    pub namespace: String,
    #[serde(default)]
    pub omit: Vec<(String, String)>,
}

/// Component removal configuration. Both values are matched literally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RemoveComponentOp {
    pub name: String,
    pub kind: String,
}

/// Container resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SetResourcesOp {
    /// Container names to update.
    pub containers: Vec<String>,
    /// Partial resource requirements merged into each container.
    pub resources: Value,
}

/// Cloud platform a deployment targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformBase {
    Gcp,
    Aws,
    Azure,
    Minikube,
    Generic,
}

impl PlatformBase {
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformBase::Gcp => "gcp",
            PlatformBase::Aws => "aws",
            PlatformBase::Azure => "azure",
            PlatformBase::Minikube => "minikube",
            PlatformBase::Generic => "generic",
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PlatformOp {
    pub base: PlatformBase,
    /// Optional patch merged into the StorageClass template.
    #[serde(default)]
    pub storage_class: Option<Value>,
}

/// TLS material and host for the ingress controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct IngressTls {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub hostname: String,
}

/// TLS material for the nginx service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServiceTls {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NginxControllerOp {
    #[serde(default)]
    pub tls: Option<IngressTls>,
    /// Overrides the upstream controller bundle location.
    #[serde(default)]
    pub bundle_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NginxServiceOp {
    pub tls: ServiceTls,
}

/// How traffic reaches the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IngressOp {
    NginxIngressController(NginxControllerOp),
    NginxNodePortService(NginxServiceOp),
    NodePort,
}

/// SSH repository cloning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SshCloningOp {
    pub key_file: PathBuf,
    pub known_hosts_file: PathBuf,
    /// Mount under `/root` (true) or `/home/sourcegraph` (false).
    #[serde(default = "default_true")]
    pub root: bool,
}

fn default_true() -> bool {
    true
}

/// Options for transforms that take none
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoOptions {}

/// All transformations that can appear in a run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transformation {
    /// Merge patches onto named documents, then unset paths.
    Overlay { overlay: OverlayOp },
    /// Merge metadata into selected documents.
    SetMetadata {
        #[serde(rename = "set-metadata")]
        set_metadata: SetMetadataOp,
    },
    /// Move selected documents to a namespace.
    SetNamespace {
        #[serde(rename = "set-namespace")]
        set_namespace: SetNamespaceOp,
    },
    /// Drop documents by name or kind.
    RemoveComponent {
        #[serde(rename = "remove-component")]
        remove_component: RemoveComponentOp,
    },
    /// Merge resource requirements into named containers.
    SetResources {
        #[serde(rename = "set-resources")]
        set_resources: SetResourcesOp,
    },
    /// Add a StorageClass for a cloud platform.
    Platform { platform: PlatformOp },
    /// Configure how traffic reaches the frontend.
    Ingress { ingress: IngressOp },
    /// Mount SSH credentials into gitserver.
    SshCloning {
        #[serde(rename = "ssh-cloning")]
        ssh_cloning: SshCloningOp,
    },
    /// Run workloads as non-root users.
    NonRoot {
        #[serde(rename = "non-root")]
        non_root: NoOptions,
    },
    /// Run workloads without privileges (currently implies non-root).
    NonPrivileged {
        #[serde(rename = "non-privileged")]
        non_privileged: NoOptions,
    },
    /// Clean up values that serialize badly.
    Normalize { normalize: NoOptions },
}

impl Transformation {
    /// The configuration key naming this transformation.
    pub fn name(&self) -> &'static str {
        match self {
            Transformation::Overlay { .. } => "overlay",
            Transformation::SetMetadata { .. } => "set-metadata",
            Transformation::SetNamespace { .. } => "set-namespace",
            Transformation::RemoveComponent { .. } => "remove-component",
            Transformation::SetResources { .. } => "set-resources",
            Transformation::Platform { .. } => "platform",
            Transformation::Ingress { .. } => "ingress",
            Transformation::SshCloning { .. } => "ssh-cloning",
            Transformation::NonRoot { .. } => "non-root",
            Transformation::NonPrivileged { .. } => "non-privileged",
            Transformation::Normalize { .. } => "normalize",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawRunConfig {
    source_directory: PathBuf,
    #[serde(default)]
    additional_manifest_directories: Vec<PathBuf>,
    output_directory: PathBuf,
    #[serde(default)]
    template_directory: Option<PathBuf>,
    #[serde(default)]
    transformations: Vec<Value>,
}

/// A complete customization run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Primary manifest directory.
    pub source_directory: PathBuf,
    /// Further manifest directories loaded after the source directory.
    pub additional_manifest_directories: Vec<PathBuf>,
    /// Where the customized manifests are written.
    pub output_directory: PathBuf,
    /// Where template fragments are read from.
    pub template_directory: PathBuf,
    /// Transformations, in application order.
    pub transformations: Vec<Transformation>,
}

impl RunConfig {
    /// Source directory followed by the additional manifest directories
    pub fn manifest_directories(&self) -> Vec<&Path> {
        std::iter::once(self.source_directory.as_path())
            .chain(self.additional_manifest_directories.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// Parse a run configuration from YAML.
pub fn parse(yaml_content: &str) -> Result<RunConfig> {
    let raw: RawRunConfig = serde_yaml::from_str(yaml_content).map_err(|err| Error::ConfigParse {
        message: err.to_string(),
        hint: Some("A run configuration needs 'source-directory' and 'output-directory'".to_string()),
    })?;

    let transformations = raw
        .transformations
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            convert_value_to_transformation(value).map_err(|err| match err {
                Error::ConfigParse { message, hint } => Error::ConfigParse {
                    message: format!("transformations[{}]: {}", idx, message),
                    hint,
                },
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RunConfig {
        source_directory: raw.source_directory,
        additional_manifest_directories: raw.additional_manifest_directories,
        output_directory: raw.output_directory,
        template_directory: raw
            .template_directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIRECTORY)),
        transformations,
    })
}

/// Parse a run configuration from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Parse a YAML list of transformations on its own.
pub fn parse_transformations(yaml_content: &str) -> Result<Vec<Transformation>> {
    let values: Vec<Value> = serde_yaml::from_str(yaml_content).map_err(Error::Yaml)?;
    values
        .into_iter()
        .map(convert_value_to_transformation)
        .collect()
}

/// Convert one configuration entry into a `Transformation`
fn convert_value_to_transformation(value: Value) -> Result<Transformation> {
    match value {
        Value::String(name) => convert_named(&name, Value::Mapping(Mapping::new())),
        Value::Mapping(map) => {
            if map.len() != 1 {
                return Err(Error::ConfigParse {
                    message: format!("Expected exactly one transformation key, found {}", map.len()),
                    hint: Some("Write each transformation as its own list item".to_string()),
                });
            }
            let mut iter = map.into_iter();
            let (key, options) = iter
                .next()
                .ok_or_else(|| Error::config("Empty transformation mapping"))?;
            let name = key
                .as_str()
                .ok_or_else(|| Error::config("Transformation key must be a string"))?
                .to_string();
            convert_named(&name, options)
        }
        _ => Err(Error::config("Expected a mapping or name for each transformation")),
    }
}

fn convert_named(name: &str, options: Value) -> Result<Transformation> {
    // `normalize:` with no value parses as null
    let options = if options.is_null() {
        Value::Mapping(Mapping::new())
    } else {
        options
    };

    match name {
        "overlay" => Ok(Transformation::Overlay {
            overlay: options_from(name, options)?,
        }),
        "set-metadata" => Ok(Transformation::SetMetadata {
            set_metadata: options_from(name, options)?,
        }),
        "set-namespace" => Ok(Transformation::SetNamespace {
            set_namespace: options_from(name, options)?,
        }),
        "remove-component" => Ok(Transformation::RemoveComponent {
            remove_component: options_from(name, options)?,
        }),
        "set-resources" => Ok(Transformation::SetResources {
            set_resources: options_from(name, options)?,
        }),
        "platform" => Ok(Transformation::Platform {
            platform: options_from(name, options)?,
        }),
        "ingress" => {
            let ingress_type = options.get("type").and_then(Value::as_str).unwrap_or_default();
            if !INGRESS_TYPES.contains(&ingress_type) {
                return Err(Error::ConfigParse {
                    message: format!("Unrecognized ingress type: {}", ingress_type),
                    hint: Some(format!("Use one of: {}", INGRESS_TYPES.join(", "))),
                });
            }
            Ok(Transformation::Ingress {
                ingress: options_from(name, options)?,
            })
        }
        "ssh-cloning" => Ok(Transformation::SshCloning {
            ssh_cloning: options_from(name, options)?,
        }),
        "non-root" => Ok(Transformation::NonRoot {
            non_root: options_from(name, options)?,
        }),
        "non-privileged" => Ok(Transformation::NonPrivileged {
            non_privileged: options_from(name, options)?,
        }),
        "normalize" => Ok(Transformation::Normalize {
            normalize: options_from(name, options)?,
        }),
        _ => Err(Error::ConfigParse {
            message: format!("Unknown transformation: {}", name),
            hint: Some(format!("Known transformations: {}", TRANSFORMATION_NAMES.join(", "))),
        }),
    }
}

fn options_from<T: serde::de::DeserializeOwned>(name: &str, options: Value) -> Result<T> {
    serde_yaml::from_value(options).map_err(|err| Error::ConfigParse {
        message: format!("Invalid options for '{}': {}", name, err),
        hint: None,
    })
}
