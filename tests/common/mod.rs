//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the prelude:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_manifest("frontend/frontend.Deployment.yaml", manifests::FRONTEND_DEPLOYMENT)
//!         .with_config(&configs::with_transformations("- non-root"));
//!     fixture.command().arg("apply").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Run configuration snippets. Directories are relative to the fixture root.
#[allow(dead_code)]
pub mod configs {
    /// Header shared by every fixture configuration.
    pub const HEADER: &str = "source-directory: base\noutput-directory: out\n";

    /// No transformations at all.
    pub const EMPTY: &str = "source-directory: base\noutput-directory: out\ntransformations: []\n";

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "source-directory: [unclosed\n";

    /// Header followed by a `transformations:` list.
    pub fn with_transformations(list: &str) -> String {
        format!("{}transformations:\n{}", HEADER, list)
    }
}

/// Manifest documents used across tests.
#[allow(dead_code)]
pub mod manifests {
    pub const FRONTEND_DEPLOYMENT: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: sourcegraph-frontend
spec:
  replicas: 1
  template:
    spec:
      containers:
        - name: frontend
          image: sourcegraph/frontend:3.30
          env: null
          resources:
            limits:
              cpu: "2"
              memory: 4G
        - name: jaeger-agent
          image: sourcegraph/jaeger-agent:3.30
"#;

    pub const FRONTEND_SERVICE: &str = r#"apiVersion: v1
kind: Service
metadata:
  name: sourcegraph-frontend
spec:
  type: ClusterIP
  ports:
    - name: http
      port: 30080
      targetPort: http
"#;

    pub const FRONTEND_SERVICE_ACCOUNT: &str = r#"apiVersion: v1
kind: ServiceAccount
metadata:
  name: sourcegraph-frontend
"#;

    pub const FRONTEND_ROLE_BINDING: &str = r#"apiVersion: rbac.authorization.k8s.io/v1
kind: RoleBinding
metadata:
  name: sourcegraph-frontend
subjects:
  - kind: ServiceAccount
    name: sourcegraph-frontend
"#;

    pub const JAEGER_DAEMON_SET: &str = r#"apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: jaeger
spec:
  template:
    spec:
      containers:
        - name: jaeger
"#;
}

/// A temporary working directory holding a configuration and manifests.
pub struct TestFixture {
    pub temp: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp: assert_fs::TempDir::new().unwrap(),
        }
    }

    /// Write `customize.yaml` at the fixture root.
    pub fn with_config(self, content: &str) -> Self {
        self.temp.child("customize.yaml").write_str(content).unwrap();
        self
    }

    /// Write a manifest under `base/`.
    pub fn with_manifest(self, path: &str, content: &str) -> Self {
        self.temp
            .child("base")
            .child(path)
            .write_str(content)
            .unwrap();
        self
    }

    /// Write an arbitrary file relative to the fixture root.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp.child(path).write_str(content).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn output(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp.child("out").child(path)
    }

    pub fn read_output(&self, path: &str) -> String {
        std::fs::read_to_string(self.output(path).path()).unwrap()
    }

    /// The binary, run from the fixture root.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("manifest-customizer");
        cmd.current_dir(self.temp.path());
        cmd.env_remove("MANIFEST_CUSTOMIZER_CONFIG");
        cmd.env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
