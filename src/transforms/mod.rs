//! Transform implementations
//!
//! A [`Transform`] is a named unit of mutation over a [`DocumentStore`]. Each
//! configured transformation is turned into one boxed transform by [`build`],
//! which also performs construction-time validation (URLs, option
//! combinations) so that configuration mistakes surface before the pipeline
//! runs.
//!
//! Library callers can add their own steps with [`from_fn`].

pub mod ingress;
pub mod metadata;
pub mod normalize;
pub mod overlay;
pub mod platform;
pub mod remove;
pub mod resources;
pub mod security;
pub mod ssh;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::{Mapping, Value};

use crate::category::Category;
use crate::config::{IngressOp, Transformation, DEFAULT_TEMPLATE_DIRECTORY};
use crate::document::{self, Document};
use crate::error::{Error, Result};
use crate::selector::Selector;
use crate::store::DocumentStore;

pub use ingress::{BundleFetcher, HttpFetcher};

/// A named mutation of the document store
pub trait Transform {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Apply the mutation in place
    fn apply(&self, store: &mut DocumentStore) -> Result<()>;
}

/// A transform backed by a closure
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&mut DocumentStore) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        (self.func)(store)
    }
}

/// Wrap a closure as a transform.
///
/// # Examples
///
/// ```
/// use manifest_customizer::store::DocumentStore;
/// use manifest_customizer::transforms::{from_fn, Transform};
///
/// let mark = from_fn("mark", |store: &mut DocumentStore| {
///     store.append_instruction("done");
///     Ok(())
/// });
/// let mut store = DocumentStore::new();
/// mark.apply(&mut store).unwrap();
/// assert_eq!(store.manual_instructions(), ["done".to_string()]);
/// ```
pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnTransform<F>
where
    F: Fn(&mut DocumentStore) -> Result<()>,
{
    FnTransform {
        name: name.into(),
        func,
    }
}

/// Collaborators shared by transforms built from configuration
#[derive(Clone)]
pub struct BuildContext {
    /// Directory holding template fragments.
    pub template_directory: PathBuf,
    /// Source of remote manifest bundles.
    pub fetcher: Arc<dyn BundleFetcher>,
}

impl BuildContext {
    /// Context fetching bundles over HTTP
    pub fn new(template_directory: impl Into<PathBuf>) -> Self {
        Self {
            template_directory: template_directory.into(),
            fetcher: Arc::new(HttpFetcher),
        }
    }

    /// Replace the bundle fetcher
    pub fn with_fetcher(mut self, fetcher: Arc<dyn BundleFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_DIRECTORY)
    }
}

/// Construct the transform for one configured transformation.
pub fn build(transformation: &Transformation, ctx: &BuildContext) -> Result<Box<dyn Transform>> {
    let transform: Box<dyn Transform> = match transformation {
        Transformation::Overlay { overlay: op } => Box::new(overlay::Overlay::from_op(op)?),
        Transformation::SetMetadata { set_metadata: op } => Box::new(metadata::SetMetadata::new(
            Selector::new(op.name.clone(), op.kind.clone()).excluding(op.omit.clone()),
            op.metadata.clone(),
        )?),
        Transformation::SetNamespace { set_namespace: op } => {
            Box::new(metadata::SetMetadata::set_namespace(
                Selector::new(op.name.clone(), op.kind.clone()).excluding(op.omit.clone()),
                &op.namespace,
            ))
        }
        Transformation::RemoveComponent {
            remove_component: op,
        } => Box::new(remove::RemoveComponent::new(&op.name, &op.kind)),
        Transformation::SetResources { set_resources: op } => Box::new(
            resources::SetResources::new(op.containers.clone(), op.resources.clone()),
        ),
        Transformation::Platform { platform: op } => Box::new(platform::Platform::new(
            op.base,
            &ctx.template_directory,
            op.storage_class.clone(),
        )),
        Transformation::Ingress { ingress: op } => match op {
            IngressOp::NginxIngressController(op) => {
                Box::new(ingress::NginxIngressController::from_op(op, ctx.fetcher.clone())?)
            }
            IngressOp::NginxNodePortService(op) => Box::new(ingress::NginxNodePortService::new(
                &ctx.template_directory,
                &op.tls.cert_file,
                &op.tls.key_file,
            )),
            IngressOp::NodePort => Box::new(ingress::NodePort),
        },
        Transformation::SshCloning { ssh_cloning: op } => Box::new(ssh::SshCloning::new(
            &op.key_file,
            &op.known_hosts_file,
            op.root,
        )),
        Transformation::NonRoot { .. } => Box::new(security::NonRoot::new()),
        Transformation::NonPrivileged { .. } => Box::new(security::NonRoot::non_privileged()),
        Transformation::Normalize { .. } => Box::new(normalize::Normalize),
    };
    Ok(transform)
}

/// Construct every configured transformation, failing on the first invalid one.
pub fn build_all(transformations: &[Transformation], ctx: &BuildContext) -> Result<Vec<Box<dyn Transform>>> {
    transformations.iter().map(|t| build(t, ctx)).collect()
}

/// Run `f` over every Deployment, then every StatefulSet.
pub(crate) fn for_each_workload(store: &mut DocumentStore, mut f: impl FnMut(&mut Document)) {
    for category in [Category::Deployments, Category::StatefulSets] {
        for doc in store.documents_mut(category) {
            f(doc);
        }
    }
}

/// Build a mapping value from string keys, keeping their order.
pub(crate) fn mapping<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    Value::Mapping(
        pairs
            .into_iter()
            .map(|(key, value)| (Value::from(key), value))
            .collect::<Mapping>(),
    )
}

/// A `v1` Secret document.
pub(crate) fn secret(name: &str, secret_type: &str, data: Vec<(&str, String)>) -> Document {
    let data: Mapping = data
        .into_iter()
        .map(|(key, value)| (Value::from(key), Value::from(value)))
        .collect();
    mapping([
        ("apiVersion", Value::from("v1")),
        ("kind", Value::from("Secret")),
        ("metadata", mapping([("name", Value::from(name))])),
        ("type", Value::from(secret_type)),
        ("data", Value::Mapping(data)),
    ])
}

/// Read a file a transform depends on (certificate, key, known hosts).
pub(crate) fn read_input(transform: &str, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| {
        Error::transform(transform, format!("failed to read {}: {}", path.display(), err))
    })
}

/// Read and parse a single-document YAML template.
pub(crate) fn read_template(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|err| Error::Template {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    let doc: Document = serde_yaml::from_str(&content).map_err(|err| Error::Template {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    if !doc.is_mapping() {
        return Err(Error::Template {
            path: path.display().to_string(),
            message: "template is not a mapping".to_string(),
        });
    }
    Ok(doc)
}

/// Remove `resources` from every container of every workload.
pub(crate) fn strip_container_resources(store: &mut DocumentStore) {
    for_each_workload(store, |doc| {
        for container in document::containers_mut(doc) {
            document::remove_key(container, "resources");
        }
    });
}
