//! SSH credentials for repository cloning

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use log::warn;
use serde_yaml::Value;

use super::{mapping, read_input, secret, Transform};
use crate::category::Category;
use crate::document;
use crate::error::Result;
use crate::store::DocumentStore;

pub const SSH_SECRET_NAME: &str = "gitserver-ssh";

const GITSERVER_SUFFIX: &str = "gitserver.StatefulSet.yaml";
const GITSERVER_CONTAINER: &str = "gitserver";
const VOLUME_NAME: &str = "ssh";
const SECRET_MODE: u32 = 0o644;

/// Add an SSH key Secret and mount it into the gitserver container.
#[derive(Debug, Clone)]
pub struct SshCloning {
    key_file: PathBuf,
    known_hosts_file: PathBuf,
    root: bool,
}

impl SshCloning {
    /// With `root`, keys are mounted at `/root/.ssh`; otherwise at
    /// `/home/sourcegraph/.ssh`.
    pub fn new(key_file: &Path, known_hosts_file: &Path, root: bool) -> Self {
        Self {
            key_file: key_file.to_path_buf(),
            known_hosts_file: known_hosts_file.to_path_buf(),
            root,
        }
    }

    fn mount_path(&self) -> &'static str {
        if self.root {
            "/root/.ssh"
        } else {
            "/home/sourcegraph/.ssh"
        }
    }
}

impl Transform for SshCloning {
    fn name(&self) -> &str {
        "ssh-cloning"
    }

    fn apply(&self, store: &mut DocumentStore) -> Result<()> {
        let key = STANDARD.encode(read_input(self.name(), &self.key_file)?);
        let known_hosts = STANDARD.encode(read_input(self.name(), &self.known_hosts_file)?);

        store.append(
            Category::Secrets,
            format!("{}.Secret.yaml", SSH_SECRET_NAME),
            secret(
                SSH_SECRET_NAME,
                "Opaque",
                vec![("id_rsa", key), ("known_hosts", known_hosts)],
            ),
        );

        let mut mounted = 0;
        for entry in store.category_mut(Category::StatefulSets) {
            if !entry.identifier.ends_with(GITSERVER_SUFFIX) {
                continue;
            }
            for container in document::containers_mut(&mut entry.document) {
                if container.get("name").and_then(Value::as_str) != Some(GITSERVER_CONTAINER) {
                    continue;
                }
                document::ensure_sequence(document::path_entry(container, &["volumeMounts"])).push(
                    mapping([
                        ("mountPath", Value::from(self.mount_path())),
                        ("name", Value::from(VOLUME_NAME)),
                    ]),
                );
            }
            let volumes = document::path_entry(
                &mut entry.document,
                &["spec", "template", "spec", "volumes"],
            );
            document::ensure_sequence(volumes).push(mapping([
                ("name", Value::from(VOLUME_NAME)),
                (
                    "secret",
                    mapping([
                        ("defaultMode", Value::from(SECRET_MODE)),
                        ("secretName", Value::from(SSH_SECRET_NAME)),
                    ]),
                ),
            ]));
            mounted += 1;
        }
        if mounted == 0 {
            warn!("ssh-cloning: no gitserver StatefulSet found");
        }
        Ok(())
    }
}
