//! Infra façade
//!
//! Holds the configured providers by name and routes each call to exactly
//! one of them. Callers only deal with [`Server`] values and provider names.

use crate::error::{CloudError, Result};
use crate::model::Server;
use crate::provider::{CloudProvider, ProvisionedServer};
use std::collections::BTreeMap;

/// All infrastructure for one environment
#[derive(Default)]
pub struct Infra {
    providers: BTreeMap<String, Box<dyn CloudProvider>>,
}

impl Infra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        provider: impl CloudProvider + 'static,
    ) -> Self {
        self.add_provider(name, Box::new(provider));
        self
    }

    /// Register a provider, returning the one previously held under `name`
    pub fn add_provider(
        &mut self,
        name: impl Into<String>,
        provider: Box<dyn CloudProvider>,
    ) -> Option<Box<dyn CloudProvider>> {
        self.providers.insert(name.into(), provider)
    }

    pub fn provider(&self, name: &str) -> Option<&dyn CloudProvider> {
        self.providers.get(name).map(|p| p.as_ref())
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn providers(&self) -> impl Iterator<Item = (&str, &dyn CloudProvider)> {
        self.providers.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provision a server on the named provider
    pub async fn provision_server(
        &mut self,
        server: Server,
        provider_name: &str,
    ) -> Result<ProvisionedServer> {
        let provider = self
            .providers
            .get_mut(provider_name)
            .ok_or_else(|| CloudError::UnknownProvider(provider_name.to_string()))?;

        tracing::debug!("Dispatching {} to provider {}", server.name(), provider_name);
        provider.provision_server(server).await
    }

    /// Apply host configuration to every provisioned server
    pub fn deploy(&self) -> Result<()> {
        Err(CloudError::NotImplementedYet(
            "deploy (host configuration of provisioned servers)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, ProviderConfig, SubnetConfig};
    use crate::engine::{MemoryEngine, ResourceDeclaration, ResourceEngine, ResourceHandle};
    use crate::provider::{
        Backend, Capabilities, Provider, ServerRequest, ServerResources, TranslationTable,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FlatBackend;

    #[async_trait]
    impl Backend for FlatBackend {
        fn name(&self) -> &str {
            "flat"
        }

        fn display_name(&self) -> &str {
            "Flat Cloud"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                supports_private_network: false,
                supports_security_groups: false,
                requires_location: false,
            }
        }

        fn sizes(&self) -> TranslationTable {
            TranslationTable::from([("small".to_string(), "f1".to_string())])
        }

        fn images(&self) -> TranslationTable {
            TranslationTable::from([("ubuntu22".to_string(), "jammy".to_string())])
        }

        fn network_declaration(&self, _config: &ProviderConfig) -> ResourceDeclaration {
            ResourceDeclaration::new("flat:Network", "network")
        }

        fn subnet_declaration(
            &self,
            _network: &ResourceHandle,
            subnet: &SubnetConfig,
            _config: &ProviderConfig,
        ) -> ResourceDeclaration {
            ResourceDeclaration::new("flat:Subnet", subnet.name.clone())
        }

        async fn create_server(
            &self,
            engine: &dyn ResourceEngine,
            request: &ServerRequest<'_>,
        ) -> Result<ServerResources> {
            let declaration = ResourceDeclaration::new("flat:Server", request.server.name());
            Ok(ServerResources::new(engine.create(&declaration).await?))
        }
    }

    async fn flat_provider() -> Provider<FlatBackend> {
        let config = ProviderConfig::new(NetworkConfig::new("10.0.0.0/16"));
        Provider::open(FlatBackend, Arc::new(MemoryEngine::new()), vec![], config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let mut infra = Infra::new().with_provider("flat", flat_provider().await);

        let entry = infra
            .provision_server(Server::new("n1", "small", "ubuntu22"), "flat")
            .await
            .unwrap();

        assert_eq!(entry.name(), "n1");
        assert_eq!(infra.provider("flat").unwrap().servers().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let mut infra = Infra::new().with_provider("flat", flat_provider().await);

        let result = infra
            .provision_server(Server::new("n1", "small", "ubuntu22"), "unknown")
            .await;

        assert!(matches!(result, Err(CloudError::UnknownProvider(name)) if name == "unknown"));
        assert!(infra.provider("flat").unwrap().servers().is_empty());
    }

    #[tokio::test]
    async fn test_add_provider_replaces() {
        let mut infra = Infra::new();
        assert!(infra.add_provider("a", Box::new(flat_provider().await)).is_none());
        assert!(infra.add_provider("a", Box::new(flat_provider().await)).is_some());
        assert_eq!(infra.len(), 1);
        assert_eq!(infra.provider_names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_deploy_not_implemented() {
        let infra = Infra::new();
        assert!(matches!(
            infra.deploy(),
            Err(CloudError::NotImplementedYet(_))
        ));
    }
}
