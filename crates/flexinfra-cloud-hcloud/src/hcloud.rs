//! hcloud CLI wrapper
//!
//! Wraps the hcloud CLI commands for Hetzner Cloud operations and exposes
//! them as a [`ResourceEngine`].

use crate::error::{HcloudError, Result};
use async_trait::async_trait;
use flexinfra_cloud::{CloudError, ResourceDeclaration, ResourceEngine, ResourceHandle};
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::process::Command;

/// hcloud CLI wrapper
#[derive(Debug, Clone)]
pub struct HcloudCli {
    /// Executable to run, `hcloud` from PATH by default
    program: String,
    /// hcloud context to use instead of the active one
    context: Option<String>,
}

impl Default for HcloudCli {
    fn default() -> Self {
        Self {
            program: "hcloud".to_string(),
            context: None,
        }
    }
}

impl HcloudCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::default()
        }
    }

    /// Run a different hcloud executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Check if hcloud is installed
    pub async fn check_installed(&self) -> Result<()> {
        let which = Command::new("which").arg(&self.program).output().await?;

        if !which.status.success() {
            return Err(HcloudError::HcloudNotFound);
        }
        Ok(())
    }

    /// Run an hcloud command and return stdout
    async fn run_command(&self, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        if let Some(context) = &self.context {
            cmd.env("HCLOUD_CONTEXT", context);
        }
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, args.join(" "));

        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HcloudError::HcloudNotFound,
            _ => HcloudError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HcloudError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Create a private network, returning its id
    pub async fn create_network(&self, name: &str, ip_range: &str) -> Result<String> {
        let output = self
            .run_command(&args(&[
                "network", "create", "--name", name, "--ip-range", ip_range, "-o", "json",
            ]))
            .await?;

        extract_id(&output, "network")
    }

    /// Add a subnet to a network
    pub async fn add_subnet(
        &self,
        network_id: &str,
        network_zone: &str,
        subnet_type: &str,
        ip_range: &str,
    ) -> Result<()> {
        self.run_command(&args(&[
            "network",
            "add-subnet",
            network_id,
            "--network-zone",
            network_zone,
            "--type",
            subnet_type,
            "--ip-range",
            ip_range,
        ]))
        .await?;
        Ok(())
    }

    /// Create a server, returning its id
    ///
    /// `hcloud server create --network` cannot pick the private address, so
    /// a fixed address is set with a separate `attach-to-network`. If that
    /// attach fails the new server is deleted again before the error is
    /// returned.
    pub async fn create_server(&self, config: &CreateServerConfig) -> Result<String> {
        let output = self.run_command(&config.create_args()).await?;
        let id = extract_id(&output, "server")?;

        if let Some(NetworkAttachment {
            network_id,
            ip: Some(ip),
        }) = &config.network
        {
            if let Err(e) = self.attach_to_network(&id, network_id, ip).await {
                tracing::warn!(
                    "Attaching server {} ({}) to network {} failed, deleting it",
                    config.name,
                    id,
                    network_id
                );
                if let Err(delete_error) = self.delete_server(&id).await {
                    tracing::error!("Failed to delete server {}: {}", id, delete_error);
                }
                return Err(e);
            }
        }

        Ok(id)
    }

    /// Delete a server
    pub async fn delete_server(&self, server_id: &str) -> Result<()> {
        self.run_command(&args(&["server", "delete", server_id]))
            .await?;
        Ok(())
    }

    /// Attach a server to a network at a fixed address
    pub async fn attach_to_network(&self, server_id: &str, network_id: &str, ip: &str) -> Result<()> {
        self.run_command(&args(&[
            "server",
            "attach-to-network",
            server_id,
            "--network",
            network_id,
            "--ip",
            ip,
        ]))
        .await?;
        Ok(())
    }

    async fn apply(&self, declaration: &ResourceDeclaration) -> Result<String> {
        match declaration.resource_type.as_str() {
            "hcloud:Network" => {
                let ip_range = required_str(declaration, "ip_range")?;
                self.create_network(&declaration.name, ip_range).await
            }
            "hcloud:NetworkSubnet" => {
                let network_id = required_str(declaration, "network_id")?;
                let ip_range = required_str(declaration, "ip_range")?;
                self.add_subnet(
                    network_id,
                    required_str(declaration, "network_zone")?,
                    required_str(declaration, "type")?,
                    ip_range,
                )
                .await?;
                // Hetzner subnets have no id of their own
                Ok(format!("{}/{}", network_id, ip_range))
            }
            "hcloud:Server" => {
                let config = CreateServerConfig::from_declaration(declaration)?;
                self.create_server(&config).await
            }
            other => Err(HcloudError::UnsupportedResource(other.to_string())),
        }
    }
}

#[async_trait]
impl ResourceEngine for HcloudCli {
    fn name(&self) -> &str {
        "hcloud-cli"
    }

    async fn create(
        &self,
        declaration: &ResourceDeclaration,
    ) -> flexinfra_cloud::Result<ResourceHandle> {
        tracing::info!("Creating {} {}", declaration.resource_type, declaration.name);
        let id = self.apply(declaration).await.map_err(|e| {
            CloudError::backend(
                format!("{} {}", declaration.resource_type, declaration.name),
                e,
            )
        })?;
        Ok(ResourceHandle::new(id, declaration))
    }
}

/// Network attachment for a new server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub network_id: String,
    pub ip: Option<String>,
}

/// Configuration for creating a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServerConfig {
    pub name: String,
    pub server_type: String,
    pub image: String,
    pub location: String,
    pub ssh_keys: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub network: Option<NetworkAttachment>,
}

impl CreateServerConfig {
    /// Read an `hcloud:Server` declaration
    pub fn from_declaration(declaration: &ResourceDeclaration) -> Result<Self> {
        let network = declaration
            .properties
            .get("networks")
            .and_then(Value::as_array)
            .and_then(|networks| networks.first())
            .and_then(|first| {
                let network_id = first.get("network_id")?.as_str()?.to_string();
                let ip = first.get("ip").and_then(Value::as_str).map(str::to_string);
                Some(NetworkAttachment { network_id, ip })
            });

        Ok(Self {
            name: declaration.name.clone(),
            server_type: required_str(declaration, "server_type")?.to_string(),
            image: required_str(declaration, "image")?.to_string(),
            location: required_str(declaration, "location")?.to_string(),
            ssh_keys: declaration.get_property("ssh_keys").unwrap_or_default(),
            labels: declaration.get_property("labels").unwrap_or_default(),
            network,
        })
    }

    fn create_args(&self) -> Vec<String> {
        let mut args = args(&[
            "server",
            "create",
            "--name",
            self.name.as_str(),
            "--type",
            self.server_type.as_str(),
            "--image",
            self.image.as_str(),
            "--location",
            self.location.as_str(),
        ]);

        for key in &self.ssh_keys {
            args.push("--ssh-key".to_string());
            args.push(key.clone());
        }

        for (key, value) in &self.labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", key, value));
        }

        // Without a fixed address the network can be attached at creation
        if let Some(NetworkAttachment {
            network_id,
            ip: None,
        }) = &self.network
        {
            args.push("--network".to_string());
            args.push(network_id.clone());
        }

        args.push("-o".to_string());
        args.push("json".to_string());
        args
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn required_str<'a>(declaration: &'a ResourceDeclaration, property: &str) -> Result<&'a str> {
    declaration
        .property_str(property)
        .ok_or_else(|| HcloudError::MissingProperty {
            resource: declaration.name.clone(),
            property: property.to_string(),
        })
}

/// Pull the id out of `{"<key>": {"id": ...}}` or `{"id": ...}`
fn extract_id(output: &str, key: &str) -> Result<String> {
    let value: Value = serde_json::from_str(output)?;
    let id = value
        .get(key)
        .and_then(|inner| inner.get("id"))
        .or_else(|| value.get("id"));

    match id {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(HcloudError::MissingId(output.trim().to_string())),
    }
}
