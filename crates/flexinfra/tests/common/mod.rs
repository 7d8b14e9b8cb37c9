use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const INFRA_YAML: &str = r#"
providers:
  hetzner:
    kind: hcloud
    ssh_keys: [deploy]
    provider_config:
      location: fsn1
      network_config:
        private_ip_range: 10.0.0.0/16
        subnets:
          - subnet_ip_range: 10.0.1.0/24
            name: web
  scw:
    kind: scaleway
    provider_config:
      location: fr-par-1
      network_config:
        private_ip_range: 10.1.0.0/16
        subnets:
          - subnet_ip_range: 10.1.1.0/24
            name: apps
servers:
  - name: n1
    provider: hetzner
    size: small
    image: ubuntu22
    ip_address: 10.0.1.5
    tags:
      env: prod
  - name: n2
    provider: scw
    size: medium
    image: debian11
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_infra_yaml(&self, content: &str) {
        let path = self.root.path().join("infra.yaml");
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}
