//! Infrastructure file model

use flexinfra_cloud::{ProviderConfig, Server};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Contents of `infra.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraConfig {
    /// Providers by name
    pub providers: BTreeMap<String, ProviderEntry>,

    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl InfraConfig {
    /// Servers whose `provider` is not declared, as (server, provider) pairs
    pub fn unknown_providers(&self) -> Vec<(&str, &str)> {
        self.servers
            .iter()
            .filter(|s| !self.providers.contains_key(&s.provider))
            .map(|s| (s.server.name(), s.provider.as_str()))
            .collect()
    }
}

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "hcloud")]
    HCloud,
    Scaleway,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::HCloud, ProviderKind::Scaleway];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::HCloud => "hcloud",
            ProviderKind::Scaleway => "scaleway",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown provider kind: {}", s))
    }
}

/// One provider instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub kind: ProviderKind,

    #[serde(default)]
    pub ssh_keys: Vec<String>,

    pub provider_config: ProviderConfig,
}

/// A server and the provider it goes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub provider: String,

    #[serde(flatten)]
    pub server: Server,
}
