//! How traffic reaches the frontend
//!
//! Three strategies are supported:
//!
//! - [`NginxIngressController`]: fetch the upstream ingress-nginx bundle,
//!   label it for pruning and ship it as a raw file. With TLS, every Ingress
//!   is rewritten for the hostname and a TLS Secret is added.
//! - [`NginxNodePortService`]: an nginx Deployment/Service/ConfigMap read
//!   from templates, with the certificate embedded in the ConfigMap.
//! - [`NodePort`]: expose the frontend service directly on each node.
//!
//! Remote bundles are fetched through the [`BundleFetcher`] trait so tests and
//! offline callers can substitute their own source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, info};
use serde::Deserialize;
use serde_yaml::Value;
use url::Url;

use super::{mapping, read_input, read_template, secret, Transform};
use crate::category::Category;
use crate::config::{IngressTls, NginxControllerOp};
use crate::document::{self, Document};
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// Upstream ingress-nginx controller bundle
pub const DEFAULT_BUNDLE_URL: &str = "https://raw.githubusercontent.com/kubernetes/ingress-nginx/controller-v0.47.0/deploy/static/provider/cloud/deploy.yaml";

/// Raw file the controller bundle is written to
pub const BUNDLE_FILENAME: &str = "ingress-nginx.yaml";

/// Name of the TLS secret referenced by rewritten ingresses
pub const TLS_SECRET_NAME: &str = "sourcegraph-tls";

/// Port exposed on every node for the frontend
pub const FRONTEND_NODE_PORT: u16 = 30080;

const FRONTEND_SERVICE_SUFFIX: &str = "sourcegraph-frontend.Service.yaml";

/// Fetches a remote manifest bundle as text
pub trait BundleFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<String>;
}

/// Fetches bundles with a blocking HTTP GET
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl BundleFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<String> {
        let network_error = |err: ureq::Error| Error::Network {
            url: url.to_string(),
            message: err.to_string(),
        };
        let mut response = ureq::get(url.as_str()).call().map_err(network_error)?;
        response.body_mut().read_to_string().map_err(network_error)
    }
}

/// Install the upstream nginx ingress controller
pub struct NginxIngressController {
    bundle_url: Url,
    tls: Option<IngressTls>,
    fetcher: Arc<dyn BundleFetcher>,
}

impl NginxIngressController {
    pub fn new(bundle_url: Url, tls: Option<IngressTls>, fetcher: Arc<dyn BundleFetcher>) -> Self {
        Self {
            bundle_url,
            tls,
            fetcher,
        }
    }

    /// Build from configuration, validating the bundle URL.
    pub fn from_op(op: &NginxControllerOp, fetcher: Arc<dyn BundleFetcher>) -> Result<Self> {
        let raw = op.bundle_url.as_deref().unwrap_or(DEFAULT_BUNDLE_URL);
        let bundle_url = Url::parse(raw).map_err(|err| Error::ConfigParse {
            message: format!("Invalid bundle URL '{}': {}", raw, err),
            hint: None,
        })?;
        if !matches!(bundle_url.scheme(), "http" | "https") {
            return Err(Error::ConfigParse {
                message: format!("Invalid bundle URL '{}': unsupported scheme", raw),
                hint: Some("Bundle URLs must use http or https".to_string()),
            });
        }
        Ok(Self::new(bundle_url, op.tls.clone(), fetcher))
    }

    /// Parse every document of the bundle and label it `deploy: sourcegraph`.
    fn labelled_bundle(&self, body: &str) -> Result<String> {
        let mut rendered = Vec::new();
        for de in serde_yaml::Deserializer::from_str(body) {
            let mut doc = Value::deserialize(de).map_err(|err| Error::Network {
                url: self.bundle_url.to_string(),
                message: format!("invalid bundle: {}", err),
            })?;
            if doc.is_null() {
                continue;
            }
            document::set_string(&mut doc, &["metadata", "labels", "deploy"], "sourcegraph");
            rendered.push(serde_yaml::to_string(&doc)?);
        }
        Ok(rendered.join("---\n"))
    }

    fn apply_tls(&self, tls: &IngressTls, store: &mut DocumentStore) -> Result<()> {
        let cert = STANDARD.encode(read_input(self.name(), &tls.cert_file)?);
        let key = STANDARD.encode(read_input(self.name(), &tls.key_file)?);

        for ingress in store.documents_mut(Category::Ingresses) {
            debug!("Routing {:?} through {}", document::name(ingress), tls.hostname);
            let spec = document::ensure_mapping(document::path_entry(ingress, &["spec"]));
            spec.insert(
                Value::from("tls"),
                Value::Sequence(vec![mapping([
                    ("hosts", Value::Sequence(vec![Value::from(tls.hostname.as_str())])),
                    ("secretName", Value::from(TLS_SECRET_NAME)),
                ])]),
            );
            spec.insert(Value::from("rules"), frontend_rules(&tls.hostname));
        }

        store.append(
            Category::Secrets,
            format!("{}.Secret.yaml", TLS_SECRET_NAME),
            secret(
                TLS_SECRET_NAME,
                "kubernetes.io/tls",
                vec![("tls.crt", cert), ("tls.key", key)],
            ),
        );
        store.append_instruction(format!(
            "Update your [site configuration](https://docs.sourcegraph.com/admin/config/site_config) to set `externalURL` to {}",
            tls.hostname
        ));
        Ok(())
    }
}

fn frontend_rules(hostname: &str) -> Value {
    let backend = mapping([(
        "service",
        mapping([
            ("name", Value::from("sourcegraph-frontend")),
            ("port", mapping([("number", Value::from(FRONTEND_NODE_PORT))])),
        ]),
    )]);
    let path = mapping([("path", Value::from("/")), ("backend", backend)]);
    Value::Sequence(vec![mapping([
        ("http", mapping([("paths", Value::Sequence(vec![path]))])),
        ("host", Value::from(hostname)),
    ])])
}

impl Transform for NginxIngressController {
    fn name(&self) -> &str {
        "ingress"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        info!("Fetching ingress controller bundle from {}", self.bundle_url);
        let body = self.fetcher.fetch(&self.bundle_url)?;
        let bundle = self.labelled_bundle(&body)?;

        if let Some(tls) = &self.tls {
            self.apply_tls(tls, store)?;
        }

        store.append_raw(BUNDLE_FILENAME, bundle);
        Ok(())
    }
}

/// Front the cluster with an nginx service built from templates
#[derive(Debug, Clone)]
pub struct NginxNodePortService {
    template_directory: PathBuf,
    cert_file: PathBuf,
    key_file: PathBuf,
}

impl NginxNodePortService {
    pub fn new(template_directory: &Path, cert_file: &Path, key_file: &Path) -> Self {
        Self {
            template_directory: template_directory.join("nginx-svc"),
            cert_file: cert_file.to_path_buf(),
            key_file: key_file.to_path_buf(),
        }
    }

    fn template(&self, kind: &str) -> Result<Document> {
        read_template(&self.template_directory.join(format!("nginx.{}.yaml", kind)))
    }
}

impl Transform for NginxNodePortService {
    fn name(&self) -> &str {
        "ingress"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let mut config_map = self.template("ConfigMap")?;
        let cert = String::from_utf8_lossy(&read_input(self.name(), &self.cert_file)?).into_owned();
        let key = String::from_utf8_lossy(&read_input(self.name(), &self.key_file)?).into_owned();
        let data = document::ensure_mapping(document::path_entry(&mut config_map, &["data"]));
        data.insert(Value::from("tls.crt"), Value::from(cert));
        data.insert(Value::from("tls.key"), Value::from(key));

        let deployment = self.template("Deployment")?;
        let service = self.template("Service")?;

        store.append(Category::ConfigMaps, "nginx.ConfigMap.yaml", config_map);
        store.append(Category::Deployments, "nginx.Deployment.yaml", deployment);
        store.append(Category::Services, "nginx.Service.yaml", service);
        Ok(())
    }
}

/// Expose the frontend service as a NodePort
#[derive(Debug, Clone, Copy, Default)]
pub struct NodePort;

impl Transform for NodePort {
    fn name(&self) -> &str {
        "ingress"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        for entry in store.category_mut(Category::Services) {
            if !entry.identifier.ends_with(FRONTEND_SERVICE_SUFFIX) {
                continue;
            }
            document::set_string(&mut entry.document, &["spec", "type"], "NodePort");
            let ports = document::get_path_mut(&mut entry.document, &["spec", "ports"])
                .and_then(Value::as_sequence_mut);
            for port in ports.into_iter().flatten() {
                if port.get("name").and_then(Value::as_str) != Some("http") {
                    continue;
                }
                if let Some(number) = port.get("port").cloned() {
                    document::ensure_mapping(port).insert(Value::from("nodePort"), number);
                }
            }
        }
        store.append_instruction(node_port_instructions());
        Ok(())
    }
}

fn node_port_instructions() -> String {
    format!(
        r#"You've configured sourcegraph-frontend to be a NodePort service. This requires exposing a port on your cluster machines to the Internet.

If you are updating an existing service, you may need to delete the old service first:

  kubectl delete svc sourcegraph-frontend
  kubectl apply --prune -l deploy=sourcegraph -f .

Google Cloud Platform
=====================

  # Expose the necessary ports.
  gcloud compute --project=$PROJECT firewall-rules create sourcegraph-frontend-http --direction=INGRESS --priority=1000 --network=default --action=ALLOW --rules=tcp:{port}

  # Find a node name
  kubectl get pods -l app=sourcegraph-frontend -o=custom-columns=NODE:.spec.nodeName

  # Get the EXTERNAL-IP address (will be ephemeral unless you
  # [make it static](https://cloud.google.com/compute/docs/ip-addresses/reserve-static-external-ip-address#promote_ephemeral_ip)
  kubectl get node $NODE -o wide

AWS
===

Update the [AWS Security Group rules](https://docs.aws.amazon.com/vpc/latest/userguide/VPC_SecurityGroups.html) for the nodes in your cluster to expose the NodePort port.

Afterward, Sourcegraph should be accessible at $EXTERNAL_ADDR:{port}, where $EXTERNAL_ADDR is the address of any node in the cluster.

Other cloud providers
=====================

Follow your cloud provider documentation to expose the NodePort port on the cluster VMs to the Internet.
"#,
        port = FRONTEND_NODE_PORT
    )
}
