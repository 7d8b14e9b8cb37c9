//! Cloud provider contract
//!
//! [`CloudProvider`] is what callers and [`crate::Infra`] talk to. It is
//! implemented once, by [`Provider`], which owns the lifecycle every backend
//! shares. Each vendor only supplies a [`Backend`]: its translation tables,
//! capabilities and the declarations it issues.

use crate::config::{NetworkConfig, ProviderConfig, SubnetConfig};
use crate::engine::{ResourceDeclaration, ResourceEngine, ResourceHandle};
use crate::error::{CloudError, Result};
use crate::model::{SecurityGroup, Server};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Symbolic key → backend-native identifier
pub type TranslationTable = BTreeMap<String, String>;

/// What a backend can do beyond creating servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// New servers are attached to the provider's private network
    pub supports_private_network: bool,

    /// Security groups can be provisioned
    pub supports_security_groups: bool,

    /// `provider_config.location` must be set to create servers
    pub requires_location: bool,
}

/// Everything a backend needs to create one server
#[derive(Debug)]
pub struct ServerRequest<'a> {
    pub server: &'a Server,
    /// Backend-native size
    pub server_type: &'a str,
    /// Backend-native image
    pub image: &'a str,
    pub ssh_keys: &'a [String],
    pub network: &'a ResourceHandle,
    pub subnets: &'a [ResourceHandle],
    pub config: &'a ProviderConfig,
}

/// Handles created for one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResources {
    /// The server itself
    pub instance: ResourceHandle,

    /// Resources created alongside it (public IPs, ...)
    #[serde(default)]
    pub dependencies: Vec<ResourceHandle>,
}

impl ServerResources {
    pub fn new(instance: ResourceHandle) -> Self {
        Self {
            instance,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, handle: ResourceHandle) -> Self {
        self.dependencies.push(handle);
        self
    }
}

/// Registry entry for a provisioned server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedServer {
    /// The server as requested
    pub server: Server,

    /// Backend-native size it was created with
    pub server_type: String,

    /// Backend-native image it was created with
    pub image: String,

    pub resources: ServerResources,
}

impl ProvisionedServer {
    pub fn name(&self) -> &str {
        self.server.name()
    }

    /// Backend id of the server instance
    pub fn id(&self) -> &str {
        &self.resources.instance.id
    }
}

/// Per-vendor half of a provider
///
/// Tables must be complete when returned; they are read once, when the
/// provider is constructed, and never changed afterwards.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the backend name (e.g., "hcloud", "scaleway")
    fn name(&self) -> &str;

    /// Returns the backend display name for UI
    fn display_name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Size translation table
    fn sizes(&self) -> TranslationTable;

    /// Image translation table
    fn images(&self) -> TranslationTable;

    /// Declaration of the private network
    fn network_declaration(&self, config: &ProviderConfig) -> ResourceDeclaration;

    /// Declaration of one subnet inside `network`
    fn subnet_declaration(
        &self,
        network: &ResourceHandle,
        subnet: &SubnetConfig,
        config: &ProviderConfig,
    ) -> ResourceDeclaration;

    /// Issue the engine calls that create one server
    async fn create_server(
        &self,
        engine: &dyn ResourceEngine,
        request: &ServerRequest<'_>,
    ) -> Result<ServerResources>;

    /// Issue the engine calls that create a security group
    async fn create_security_group(
        &self,
        _engine: &dyn ResourceEngine,
        _group: &SecurityGroup,
    ) -> Result<ResourceHandle> {
        Err(CloudError::unsupported(self.name(), "security groups"))
    }
}

/// Cloud provider abstraction trait
///
/// All backends are reached through this trait so callers can treat them
/// interchangeably.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "hcloud", "scaleway")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn ssh_keys(&self) -> &[String];

    fn provider_config(&self) -> &ProviderConfig;

    fn sizes(&self) -> &TranslationTable;

    fn images(&self) -> &TranslationTable;

    /// Private network handle, `None` until initialized
    fn network(&self) -> Option<&ResourceHandle>;

    fn subnets(&self) -> &[ResourceHandle];

    /// Servers provisioned by this instance, oldest first
    fn servers(&self) -> &[ProvisionedServer];

    /// Check that a network layout can be provisioned
    fn network_config_is_valid(&self, network_config: &NetworkConfig) -> bool {
        match network_config.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Rejected network config for {}: {}", self.name(), e);
                false
            }
        }
    }

    /// Check `size` and `image` against this provider's own tables
    ///
    /// Address and tags are not looked at.
    fn server_object_is_valid(&self, server: &Server) -> bool {
        self.images().contains_key(server.image()) && self.sizes().contains_key(server.size())
    }

    /// Validate, create the server, and record it in the registry
    async fn provision_server(&mut self, server: Server) -> Result<ProvisionedServer>;

    /// Provision a security group
    async fn provision_security_group(&mut self, group: &SecurityGroup) -> Result<ResourceHandle>;
}

/// The lifecycle shared by every backend
///
/// Construction is split in two: [`Provider::new`] stores the configuration
/// and fills the tables without touching any backend, [`Provider::initialize`]
/// provisions the network and then each subnet, in that order.
pub struct Provider<B: Backend> {
    backend: B,
    engine: Arc<dyn ResourceEngine>,
    ssh_keys: Vec<String>,
    provider_config: ProviderConfig,
    sizes: TranslationTable,
    images: TranslationTable,
    network: Option<ResourceHandle>,
    subnets: Vec<ResourceHandle>,
    servers: Vec<ProvisionedServer>,
}

impl<B: Backend> Provider<B> {
    pub fn new(
        backend: B,
        engine: Arc<dyn ResourceEngine>,
        ssh_keys: Vec<String>,
        provider_config: ProviderConfig,
    ) -> Self {
        tracing::info!(
            "Initializing {} provider, config: {:?}",
            backend.name(),
            provider_config
        );
        let sizes = backend.sizes();
        let images = backend.images();

        Self {
            backend,
            engine,
            ssh_keys,
            provider_config,
            sizes,
            images,
            network: None,
            subnets: Vec::new(),
            servers: Vec::new(),
        }
    }

    /// Construct and initialize in one step
    pub async fn open(
        backend: B,
        engine: Arc<dyn ResourceEngine>,
        ssh_keys: Vec<String>,
        provider_config: ProviderConfig,
    ) -> Result<Self> {
        let mut provider = Self::new(backend, engine, ssh_keys, provider_config);
        provider.initialize().await?;
        Ok(provider)
    }

    /// Provision the private network, then every configured subnet
    ///
    /// The network config is validated before the first engine call. A
    /// failure part-way leaves the provider uninitialized; resources already
    /// created are not cleaned up.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Err(CloudError::AlreadyInitialized(self.backend.name().to_string()));
        }
        self.provider_config.network_config.validate()?;

        tracing::info!("Provisioning private network on {}", self.backend.name());
        let network = self
            .engine
            .create(&self.backend.network_declaration(&self.provider_config))
            .await?;

        let mut subnets = Vec::with_capacity(self.provider_config.network_config.subnets.len());
        for subnet in &self.provider_config.network_config.subnets {
            tracing::info!("Provisioning subnet {} ({})", subnet.name, subnet.subnet_ip_range);
            let declaration =
                self.backend
                    .subnet_declaration(&network, subnet, &self.provider_config);
            subnets.push(self.engine.create(&declaration).await?);
        }

        self.network = Some(network);
        self.subnets = subnets;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.network.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_server(&self, server: &Server) -> Result<()> {
        if !self.sizes.contains_key(server.size()) {
            return Err(CloudError::invalid_server(
                server.name(),
                format!("size '{}' is not offered by {}", server.size(), self.name()),
            ));
        }
        if !self.images.contains_key(server.image()) {
            return Err(CloudError::invalid_server(
                server.name(),
                format!("image '{}' is not offered by {}", server.image(), self.name()),
            ));
        }
        if self.servers.iter().any(|s| s.name() == server.name()) {
            return Err(CloudError::invalid_server(
                server.name(),
                "a server with this name was already provisioned",
            ));
        }
        Ok(())
    }

    /// The caller-chosen address must sit inside a provisioned subnet
    fn check_address(&self, server: &Server) -> Result<()> {
        let Some(ip_address) = server.ip_address() else {
            return Ok(());
        };

        if !self.capabilities().supports_private_network {
            tracing::warn!(
                "{} does not attach servers to the private network, ignoring ip_address {} of {}",
                self.name(),
                ip_address,
                server.name()
            );
            return Ok(());
        }

        let ip: IpAddr = ip_address.parse().map_err(|_| {
            CloudError::invalid_server(
                server.name(),
                format!("'{}' is not an IP address", ip_address),
            )
        })?;

        if self
            .provider_config
            .network_config
            .subnet_containing(&ip)
            .is_none()
        {
            return Err(CloudError::invalid_server(
                server.name(),
                format!("{} is not inside any provisioned subnet", ip),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<B: Backend> CloudProvider for Provider<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn display_name(&self) -> &str {
        self.backend.display_name()
    }

    fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    fn ssh_keys(&self) -> &[String] {
        &self.ssh_keys
    }

    fn provider_config(&self) -> &ProviderConfig {
        &self.provider_config
    }

    fn sizes(&self) -> &TranslationTable {
        &self.sizes
    }

    fn images(&self) -> &TranslationTable {
        &self.images
    }

    fn network(&self) -> Option<&ResourceHandle> {
        self.network.as_ref()
    }

    fn subnets(&self) -> &[ResourceHandle] {
        &self.subnets
    }

    fn servers(&self) -> &[ProvisionedServer] {
        &self.servers
    }

    async fn provision_server(&mut self, server: Server) -> Result<ProvisionedServer> {
        let network = self
            .network
            .as_ref()
            .ok_or_else(|| CloudError::NotInitialized(self.backend.name().to_string()))?;

        self.check_server(&server)?;
        self.check_address(&server)?;

        if self.capabilities().requires_location && self.provider_config.location.is_none() {
            return Err(CloudError::InvalidConfig(format!(
                "{} requires provider_config.location",
                self.name()
            )));
        }

        let server_type = self.sizes[server.size()].clone();
        let image = self.images[server.image()].clone();

        tracing::info!(
            "Provisioning server {} on {} ({}, {})",
            server.name(),
            self.name(),
            server_type,
            image
        );

        let request = ServerRequest {
            server: &server,
            server_type: &server_type,
            image: &image,
            ssh_keys: &self.ssh_keys,
            network,
            subnets: &self.subnets,
            config: &self.provider_config,
        };
        let resources = self
            .backend
            .create_server(self.engine.as_ref(), &request)
            .await?;

        let entry = ProvisionedServer {
            server,
            server_type,
            image,
            resources,
        };
        tracing::info!("Provisioned server {} (ID: {})", entry.name(), entry.id());
        self.servers.push(entry.clone());
        Ok(entry)
    }

    async fn provision_security_group(&mut self, group: &SecurityGroup) -> Result<ResourceHandle> {
        if !self.capabilities().supports_security_groups {
            return Err(CloudError::unsupported(self.name(), "security groups"));
        }
        self.backend
            .create_security_group(self.engine.as_ref(), group)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;

    struct TestBackend {
        capabilities: Capabilities,
    }

    impl TestBackend {
        fn private() -> Self {
            Self {
                capabilities: Capabilities {
                    supports_private_network: true,
                    supports_security_groups: false,
                    requires_location: true,
                },
            }
        }
    }

    #[async_trait]
    impl Backend for TestBackend {
        fn name(&self) -> &str {
            "test"
        }

        fn display_name(&self) -> &str {
            "Test Cloud"
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn sizes(&self) -> TranslationTable {
            [("small", "t-small")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        fn images(&self) -> TranslationTable {
            [("ubuntu22", "t-ubuntu")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        fn network_declaration(&self, config: &ProviderConfig) -> ResourceDeclaration {
            ResourceDeclaration::new("test:Network", "network")
                .with_property("ip_range", config.network_config.private_ip_range.clone())
        }

        fn subnet_declaration(
            &self,
            network: &ResourceHandle,
            subnet: &SubnetConfig,
            _config: &ProviderConfig,
        ) -> ResourceDeclaration {
            ResourceDeclaration::new("test:Subnet", subnet.name.clone())
                .with_property("network_id", network.id.clone())
        }

        async fn create_server(
            &self,
            engine: &dyn ResourceEngine,
            request: &ServerRequest<'_>,
        ) -> Result<ServerResources> {
            let declaration = ResourceDeclaration::new("test:Server", request.server.name())
                .with_property("type", request.server_type)
                .with_property("image", request.image);
            Ok(ServerResources::new(engine.create(&declaration).await?))
        }
    }

    fn config() -> ProviderConfig {
        ProviderConfig::new(
            NetworkConfig::new("10.0.0.0/16").with_subnet("web", "10.0.1.0/24"),
        )
        .with_location("zone-1")
    }

    #[test]
    fn test_new_does_not_touch_engine() {
        let engine = Arc::new(MemoryEngine::new());
        let provider = Provider::new(TestBackend::private(), engine.clone(), vec![], config());

        assert!(engine.is_empty());
        assert!(!provider.is_initialized());
        assert!(provider.network().is_none());
        assert_eq!(provider.sizes()["small"], "t-small");
        assert!(provider.servers().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_provisions_network_then_subnets() {
        let engine = Arc::new(MemoryEngine::new());
        let provider = Provider::open(TestBackend::private(), engine.clone(), vec![], config())
            .await
            .unwrap();

        let declarations = engine.declarations();
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].resource_type, "test:Network");
        assert_eq!(declarations[1].resource_type, "test:Subnet");
        assert_eq!(
            declarations[1].property_str("network_id"),
            provider.network().map(|n| n.id.as_str())
        );
        assert_eq!(provider.subnets().len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_twice_fails() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::open(TestBackend::private(), engine, vec![], config())
            .await
            .unwrap();

        assert!(matches!(
            provider.initialize().await,
            Err(CloudError::AlreadyInitialized(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_network_config() {
        let engine = Arc::new(MemoryEngine::new());
        let bad = ProviderConfig::new(
            NetworkConfig::new("10.0.0.0/16").with_subnet("web", "172.16.0.0/24"),
        );
        let mut provider = Provider::new(TestBackend::private(), engine.clone(), vec![], bad);

        assert!(matches!(
            provider.initialize().await,
            Err(CloudError::InvalidConfig(_))
        ));
        assert!(engine.is_empty());
        assert!(!provider.is_initialized());
    }

    #[tokio::test]
    async fn test_provision_before_initialize_fails() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::new(TestBackend::private(), engine.clone(), vec![], config());

        let result = provider
            .provision_server(Server::new("n1", "small", "ubuntu22"))
            .await;
        assert!(matches!(result, Err(CloudError::NotInitialized(_))));
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn test_provision_server_records_entry() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::open(TestBackend::private(), engine, vec![], config())
            .await
            .unwrap();

        let entry = provider
            .provision_server(Server::new("n1", "small", "ubuntu22").with_ip_address("10.0.1.5"))
            .await
            .unwrap();

        assert_eq!(entry.name(), "n1");
        assert_eq!(entry.server_type, "t-small");
        assert_eq!(entry.image, "t-ubuntu");
        assert_eq!(provider.servers().len(), 1);
        assert_eq!(provider.servers()[0].id(), entry.id());
    }

    #[tokio::test]
    async fn test_provision_server_rejects_unknown_keys() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::open(TestBackend::private(), engine.clone(), vec![], config())
            .await
            .unwrap();
        let before = engine.len();

        for server in [
            Server::new("n2", "huge", "ubuntu22"),
            Server::new("n2", "small", "plan9"),
        ] {
            assert!(!provider.server_object_is_valid(&server));
            let result = provider.provision_server(server).await;
            assert!(matches!(result, Err(CloudError::InvalidServer { .. })));
        }

        assert_eq!(engine.len(), before);
        assert!(provider.servers().is_empty());
    }

    #[tokio::test]
    async fn test_provision_server_rejects_address_outside_subnets() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::open(TestBackend::private(), engine, vec![], config())
            .await
            .unwrap();

        let outside = Server::new("n1", "small", "ubuntu22").with_ip_address("10.0.9.5");
        assert!(provider.server_object_is_valid(&outside));
        assert!(matches!(
            provider.provision_server(outside).await,
            Err(CloudError::InvalidServer { .. })
        ));

        let garbage = Server::new("n1", "small", "ubuntu22").with_ip_address("ten.zero");
        assert!(provider.provision_server(garbage).await.is_err());
        assert!(provider.servers().is_empty());
    }

    #[tokio::test]
    async fn test_provision_server_rejects_duplicate_name() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::open(TestBackend::private(), engine, vec![], config())
            .await
            .unwrap();

        provider
            .provision_server(Server::new("n1", "small", "ubuntu22"))
            .await
            .unwrap();
        let again = provider
            .provision_server(Server::new("n1", "small", "ubuntu22"))
            .await;

        assert!(matches!(again, Err(CloudError::InvalidServer { .. })));
        assert_eq!(provider.servers().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_location_is_rejected_before_backend_call() {
        let engine = Arc::new(MemoryEngine::new());
        let no_location = ProviderConfig::new(NetworkConfig::new("10.0.0.0/16"));
        let mut provider = Provider::open(TestBackend::private(), engine.clone(), vec![], no_location)
            .await
            .unwrap();
        let before = engine.len();

        let result = provider
            .provision_server(Server::new("n1", "small", "ubuntu22"))
            .await;

        assert!(matches!(result, Err(CloudError::InvalidConfig(_))));
        assert_eq!(engine.len(), before);
    }

    #[tokio::test]
    async fn test_security_groups_unsupported() {
        let engine = Arc::new(MemoryEngine::new());
        let mut provider = Provider::open(TestBackend::private(), engine, vec![], config())
            .await
            .unwrap();

        let result = provider
            .provision_security_group(&SecurityGroup::new("web", vec![]))
            .await;
        assert!(matches!(result, Err(CloudError::Unsupported { .. })));
    }

    #[test]
    fn test_network_config_predicate() {
        let provider = Provider::new(
            TestBackend::private(),
            Arc::new(MemoryEngine::new()),
            vec![],
            config(),
        );

        assert!(provider.network_config_is_valid(&config().network_config));
        assert!(!provider.network_config_is_valid(&NetworkConfig::new("10.0.0.0/99")));
    }
}
