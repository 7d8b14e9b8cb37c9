//! flexinfra
//!
//! Glue between the infrastructure file and the provider crates: builds one
//! provider per `providers` entry and provisions the listed servers through
//! an [`Infra`].

use flexinfra_cloud::{
    CloudProvider, Infra, MemoryEngine, ProvisionedServer, ResourceEngine, Server,
};
use flexinfra_cloud_hcloud::{HCloudProvider, HcloudBackend, HcloudCli};
use flexinfra_cloud_scaleway::{ScalewayBackend, ScalewayProvider, ScwCli};
use flexinfra_config::{InfraConfig, ProviderEntry, ProviderKind};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load the infrastructure file, from `path` or the default lookup
pub fn load_config(path: Option<&Path>) -> flexinfra_config::Result<(PathBuf, InfraConfig)> {
    match path {
        Some(path) => Ok((path.to_path_buf(), flexinfra_config::load_infra_file(path)?)),
        None => flexinfra_config::load(),
    }
}

/// The engine that talks to the vendor for `kind`
pub fn cli_engine(kind: ProviderKind) -> Arc<dyn ResourceEngine> {
    match kind {
        ProviderKind::HCloud => Arc::new(HcloudCli::new()),
        ProviderKind::Scaleway => Arc::new(ScwCli::new()),
    }
}

/// Make sure the vendor CLI behind `kind` is on PATH
pub async fn check_cli_installed(kind: ProviderKind) -> anyhow::Result<()> {
    match kind {
        ProviderKind::HCloud => HcloudCli::new().check_installed().await?,
        ProviderKind::Scaleway => ScwCli::new().check_installed().await?,
    }
    Ok(())
}

/// Construct a provider without touching the backend
pub fn build_provider(
    entry: &ProviderEntry,
    engine: Arc<dyn ResourceEngine>,
) -> Box<dyn CloudProvider> {
    let ssh_keys = entry.ssh_keys.clone();
    let config = entry.provider_config.clone();

    match entry.kind {
        ProviderKind::HCloud => Box::new(HCloudProvider::new(HcloudBackend, engine, ssh_keys, config)),
        ProviderKind::Scaleway => {
            Box::new(ScalewayProvider::new(ScalewayBackend, engine, ssh_keys, config))
        }
    }
}

/// Construct a provider and provision its network
pub async fn open_provider(
    entry: &ProviderEntry,
    engine: Arc<dyn ResourceEngine>,
) -> flexinfra_cloud::Result<Box<dyn CloudProvider>> {
    let ssh_keys = entry.ssh_keys.clone();
    let config = entry.provider_config.clone();

    let provider: Box<dyn CloudProvider> = match entry.kind {
        ProviderKind::HCloud => Box::new(
            HCloudProvider::open(HcloudBackend, engine, ssh_keys, config).await?,
        ),
        ProviderKind::Scaleway => Box::new(
            ScalewayProvider::open(ScalewayBackend, engine, ssh_keys, config).await?,
        ),
    };
    Ok(provider)
}

/// Open every configured provider, in name order
pub async fn build_infra<F>(config: &InfraConfig, engine_for: F) -> flexinfra_cloud::Result<Infra>
where
    F: Fn(ProviderKind) -> Arc<dyn ResourceEngine>,
{
    let mut infra = Infra::new();
    for (name, entry) in &config.providers {
        tracing::debug!("Opening provider {} ({})", name, entry.kind);
        let provider = open_provider(entry, engine_for(entry.kind)).await?;
        infra.add_provider(name.clone(), provider);
    }
    Ok(infra)
}

/// Provision every configured server, stopping at the first error
pub async fn provision_all(
    infra: &mut Infra,
    config: &InfraConfig,
) -> flexinfra_cloud::Result<Vec<ProvisionedServer>> {
    let mut provisioned = Vec::with_capacity(config.servers.len());
    for entry in &config.servers {
        let server = infra
            .provision_server(entry.server.clone(), &entry.provider)
            .await?;
        provisioned.push(server);
    }
    Ok(provisioned)
}

/// Something `validate` found wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// `provider <name>` or `server <name>`
    pub subject: String,
    pub message: String,
}

impl Problem {
    fn provider(name: &str, message: impl Into<String>) -> Self {
        Self {
            subject: format!("provider {}", name),
            message: message.into(),
        }
    }

    fn server(server: &Server, message: impl Into<String>) -> Self {
        Self {
            subject: format!("server {}", server.name()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Static checks on an infrastructure file
///
/// Providers are only constructed, never initialized, so no backend is
/// contacted.
pub fn check(config: &InfraConfig) -> Vec<Problem> {
    let engine: Arc<dyn ResourceEngine> = Arc::new(MemoryEngine::new());
    let mut problems = Vec::new();

    for (name, entry) in &config.providers {
        let provider = build_provider(entry, engine.clone());
        let network_config = &entry.provider_config.network_config;

        if !provider.network_config_is_valid(network_config) {
            let reason = network_config
                .validate()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "network config rejected".to_string());
            problems.push(Problem::provider(name, reason));
        }
        if provider.capabilities().requires_location && entry.provider_config.location.is_none() {
            problems.push(Problem::provider(
                name,
                format!("{} requires provider_config.location", entry.kind),
            ));
        }
    }

    let mut seen = HashSet::new();
    for entry in &config.servers {
        let Some(provider_entry) = config.providers.get(&entry.provider) else {
            problems.push(Problem::server(
                &entry.server,
                format!("unknown provider '{}'", entry.provider),
            ));
            continue;
        };

        if !seen.insert((entry.provider.as_str(), entry.server.name())) {
            problems.push(Problem::server(
                &entry.server,
                format!("declared twice for provider '{}'", entry.provider),
            ));
        }

        let provider = build_provider(provider_entry, engine.clone());
        if !provider.server_object_is_valid(&entry.server) {
            problems.push(Problem::server(
                &entry.server,
                format!(
                    "size '{}' / image '{}' not offered by {}",
                    entry.server.size(),
                    entry.server.image(),
                    provider.name()
                ),
            ));
        }

        if let Some(problem) = check_address(provider.as_ref(), &entry.server) {
            problems.push(problem);
        }
    }

    problems
}

/// Same address rule `provision_server` applies
fn check_address(provider: &dyn CloudProvider, server: &Server) -> Option<Problem> {
    let ip_address = server.ip_address()?;
    if !provider.capabilities().supports_private_network {
        return None;
    }

    let Ok(ip) = ip_address.parse::<IpAddr>() else {
        return Some(Problem::server(
            server,
            format!("'{}' is not an IP address", ip_address),
        ));
    };
    if provider
        .provider_config()
        .network_config
        .subnet_containing(&ip)
        .is_none()
    {
        return Some(Problem::server(
            server,
            format!("{} is not inside any provisioned subnet", ip),
        ));
    }
    None
}
