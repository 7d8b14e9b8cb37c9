//! scw CLI wrapper
//!
//! Wraps the scw CLI commands for Scaleway operations and exposes them as a
//! [`ResourceEngine`].

use crate::error::{Result, ScalewayError};
use async_trait::async_trait;
use flexinfra_cloud::{CloudError, ResourceDeclaration, ResourceEngine, ResourceHandle};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

/// scw CLI wrapper
#[derive(Debug, Clone, Default)]
pub struct ScwCli {
    /// scw config profile to use instead of the default one
    profile: Option<String>,
}

impl ScwCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: Some(profile.into()),
        }
    }

    /// Check if scw is installed
    pub async fn check_installed(&self) -> Result<()> {
        let which = Command::new("which").arg("scw").output().await?;

        if !which.status.success() {
            return Err(ScalewayError::ScwNotFound);
        }
        Ok(())
    }

    /// Run an scw command with JSON output and return stdout
    async fn run_command(&self, args: &[String]) -> Result<String> {
        let mut cmd = Command::new("scw");
        if let Some(profile) = &self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.args(args);
        cmd.arg("-o").arg("json");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: scw {}", args.join(" "));

        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScalewayError::ScwNotFound,
            _ => ScalewayError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScalewayError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn create_from(&self, args: Vec<String>, key: &str) -> Result<String> {
        let output = self.run_command(&args).await?;
        extract_id(&output, key)
    }

    async fn apply(&self, declaration: &ResourceDeclaration) -> Result<String> {
        let args = command_args(declaration)?;
        let key = match declaration.resource_type.as_str() {
            "scaleway:InstanceIp" => "ip",
            "scaleway:InstanceServer" => "server",
            _ => "",
        };
        self.create_from(args, key).await
    }
}

#[async_trait]
impl ResourceEngine for ScwCli {
    fn name(&self) -> &str {
        "scw-cli"
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

/// Translate a declaration into `scw` arguments (`key=value` style)
fn command_args(declaration: &ResourceDeclaration) -> Result<Vec<String>> {
    let mut args: Vec<String> = match declaration.resource_type.as_str() {
        "scaleway:Vpc" => vec![
            "vpc".into(),
            "vpc".into(),
            "create".into(),
            format!("name={}", declaration.name),
        ],
        "scaleway:VpcPrivateNetwork" => {
            let subnet = declaration
                .properties
                .get("ipv4_subnet")
                .and_then(|s| s.get("subnet"))
                .and_then(Value::as_str)
                .ok_or_else(|| missing(declaration, "ipv4_subnet.subnet"))?;
            vec![
                "vpc".into(),
                "private-network".into(),
                "create".into(),
                format!("name={}", declaration.name),
                format!("vpc-id={}", required_str(declaration, "vpc_id")?),
                format!("subnets.0={}", subnet),
            ]
        }
        "scaleway:InstanceIp" => vec![
            "instance".into(),
            "ip".into(),
            "create".into(),
            format!("tags.0=name={}", declaration.name),
        ],
        "scaleway:InstanceServer" => {
            let mut args = vec![
                "instance".into(),
                "server".into(),
                "create".into(),
                format!("name={}", declaration.name),
                format!("type={}", required_str(declaration, "type")?),
                format!("image={}", required_str(declaration, "image")?),
                format!("ip={}", required_str(declaration, "ip_id")?),
            ];
            let tags: Vec<String> = declaration.get_property("tags").unwrap_or_default();
            for (i, tag) in tags.iter().enumerate() {
                args.push(format!("tags.{}={}", i, tag));
            }
            args
        }
        other => return Err(ScalewayError::UnsupportedResource(other.to_string())),
    };

    if let Some(zone) = declaration.property_str("zone") {
        args.push(format!("zone={}", zone));
    }
    Ok(args)
}

fn missing(declaration: &ResourceDeclaration, property: &str) -> ScalewayError {
    ScalewayError::MissingProperty {
        resource: declaration.name.clone(),
        property: property.to_string(),
    }
}

fn required_str<'a>(declaration: &'a ResourceDeclaration, property: &str) -> Result<&'a str> {
    declaration
        .property_str(property)
        .ok_or_else(|| missing(declaration, property))
}

/// Pull the id out of `{"<key>": {"id": ...}}` or `{"id": ...}`
fn extract_id(output: &str, key: &str) -> Result<String> {
    let value: Value = serde_json::from_str(output)?;
    let id = value
        .get(key)
        .and_then(|inner| inner.get("id"))
        .or_else(|| value.get("id"));

    match id {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ScalewayError::MissingId(output.trim().to_string())),
    }
}
