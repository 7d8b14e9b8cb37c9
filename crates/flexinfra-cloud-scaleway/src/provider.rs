//! Scaleway provider implementation

use async_trait::async_trait;
use flexinfra_cloud::{
    Backend, Capabilities, Provider, ProviderConfig, ResourceDeclaration, ResourceEngine,
    ResourceHandle, ServerRequest, ServerResources, SubnetConfig, TranslationTable,
};
use serde_json::json;

/// Symbolic tier → Scaleway commercial type
const SIZES: &[(&str, &str)] = &[
    ("small", "DEV1-S"),
    ("medium", "DEV1-M"),
    ("large", "DEV1-L"),
    ("xlarge", "DEV1-XL"),
];

/// Symbolic distro → Scaleway marketplace image label
const IMAGES: &[(&str, &str)] = &[
    ("ubuntu22", "ubuntu_jammy"),
    ("debian11", "debian_bullseye"),
    ("rocky9", "rockylinux_9"),
    ("centos7", "centos_7.9"),
];

/// Scaleway provider
pub type ScalewayProvider = Provider<ScalewayBackend>;

/// Scaleway backend
///
/// Each server gets its own public IP. Servers are not attached to the
/// private networks provisioned at initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalewayBackend;

fn table(entries: &[(&str, &str)]) -> TranslationTable {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn with_zone(declaration: ResourceDeclaration, config: &ProviderConfig) -> ResourceDeclaration {
    match &config.location {
        Some(zone) => declaration.with_property("zone", zone.clone()),
        None => declaration,
    }
}

#[async_trait]
impl Backend for ScalewayBackend {
    fn name(&self) -> &str {
        "scaleway"
    }

    fn display_name(&self) -> &str {
        "Scaleway"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_private_network: false,
            supports_security_groups: false,
            requires_location: false,
        }
    }

    fn sizes(&self) -> TranslationTable {
        table(SIZES)
    }

    fn images(&self) -> TranslationTable {
        table(IMAGES)
    }

    fn network_declaration(&self, _config: &ProviderConfig) -> ResourceDeclaration {
        ResourceDeclaration::new("scaleway:Vpc", "network")
    }

    fn subnet_declaration(
        &self,
        network: &ResourceHandle,
        subnet: &SubnetConfig,
        _config: &ProviderConfig,
    ) -> ResourceDeclaration {
        ResourceDeclaration::new("scaleway:VpcPrivateNetwork", subnet.name.clone())
            .with_property("vpc_id", network.id.clone())
            .with_property("ipv4_subnet", json!({ "subnet": subnet.subnet_ip_range }))
    }

    async fn create_server(
        &self,
        engine: &dyn ResourceEngine,
        request: &ServerRequest<'_>,
    ) -> flexinfra_cloud::Result<ServerResources> {
        let server = request.server;

        let ip_declaration = with_zone(
            ResourceDeclaration::new("scaleway:InstanceIp", format!("public_ip_{}", server.name())),
            request.config,
        );
        let ip = engine.create(&ip_declaration).await?;

        let tags: Vec<String> = server
            .tags()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let server_declaration = with_zone(
            ResourceDeclaration::new("scaleway:InstanceServer", server.name())
                .with_property("image", request.image)
                .with_property("type", request.server_type)
                .with_property("ip_id", ip.id.clone())
                .with_property("tags", json!(tags)),
            request.config,
        );

        // The IP is left in place if this fails
        let instance = engine.create(&server_declaration).await?;
        Ok(ServerResources::new(instance).with_dependency(ip))
    }
}
