//! Hetzner Cloud provider implementation

use async_trait::async_trait;
use flexinfra_cloud::{
    Backend, Capabilities, CloudError, Provider, ProviderConfig, ResourceDeclaration,
    ResourceEngine, ResourceHandle, ServerRequest, ServerResources, SubnetConfig,
    TranslationTable,
};
use serde_json::json;

/// Symbolic tier → Hetzner server type
const SIZES: &[(&str, &str)] = &[
    ("small", "cx11"),
    ("medium", "cx21"),
    ("large", "cx31"),
    ("xlarge", "cx41"),
];

/// Symbolic distro → Hetzner image name
const IMAGES: &[(&str, &str)] = &[
    ("ubuntu22", "ubuntu-20.04"),
    ("debian11", "debian-11"),
    ("rocky8", "rocky-8"),
    ("rocky9", "rocky-9"),
    ("centos7", "centos-7"),
];

const NETWORK_ZONE: &str = "eu-central";
const SUBNET_TYPE: &str = "cloud";

/// Hetzner Cloud provider
pub type HCloudProvider = Provider<HcloudBackend>;

/// Hetzner Cloud backend
///
/// Servers are attached to the provider's private network. Hetzner does not
/// pick the private address here: the server's `ip_address` is passed as is,
/// and left to the engine when absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct HcloudBackend;

fn table(entries: &[(&str, &str)]) -> TranslationTable {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[async_trait]
impl Backend for HcloudBackend {
    fn name(&self) -> &str {
        "hcloud"
    }

    fn display_name(&self) -> &str {
        "Hetzner Cloud"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_private_network: true,
            supports_security_groups: false,
            requires_location: true,
        }
    }

    fn sizes(&self) -> TranslationTable {
        table(SIZES)
    }

    fn images(&self) -> TranslationTable {
        table(IMAGES)
    }

    fn network_declaration(&self, config: &ProviderConfig) -> ResourceDeclaration {
        ResourceDeclaration::new("hcloud:Network", "network")
            .with_property("ip_range", config.network_config.private_ip_range.clone())
    }

    fn subnet_declaration(
        &self,
        network: &ResourceHandle,
        subnet: &SubnetConfig,
        _config: &ProviderConfig,
    ) -> ResourceDeclaration {
        ResourceDeclaration::new("hcloud:NetworkSubnet", subnet.name.clone())
            .with_property("network_id", network.id.clone())
            .with_property("ip_range", subnet.subnet_ip_range.clone())
            .with_property("network_zone", NETWORK_ZONE)
            .with_property("type", SUBNET_TYPE)
    }

    async fn create_server(
        &self,
        engine: &dyn ResourceEngine,
        request: &ServerRequest<'_>,
    ) -> flexinfra_cloud::Result<ServerResources> {
        let location = request.config.location.as_deref().ok_or_else(|| {
            CloudError::InvalidConfig("hcloud requires provider_config.location".to_string())
        })?;

        let declaration = ResourceDeclaration::new("hcloud:Server", request.server.name())
            .with_property("server_type", request.server_type)
            .with_property("image", request.image)
            .with_property("ssh_keys", json!(request.ssh_keys))
            .with_property(
                "networks",
                json!([{
                    "network_id": request.network.id,
                    "ip": request.server.ip_address(),
                }]),
            )
            .with_property("location", location)
            .with_property("labels", json!(request.server.tags()));

        let instance = engine.create(&declaration).await?;
        Ok(ServerResources::new(instance))
    }
}
