//! Resource-provisioning engine seam
//!
//! Backends never talk to a vendor directly. They describe the resource they
//! want as a [`ResourceDeclaration`] and hand it to a [`ResourceEngine`],
//! which performs the actual creation and returns an opaque
//! [`ResourceHandle`].

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Mutex;

/// A vendor resource to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Vendor resource type (e.g., "hcloud:Server", "scaleway:InstanceIp")
    pub resource_type: String,

    /// Logical resource name
    pub name: String,

    /// Vendor-specific properties
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ResourceDeclaration {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get a property as a specific type
    pub fn get_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// Opaque handle to a created resource
///
/// Only `id` is relied upon by the core; the declared properties are kept
/// for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub id: String,
    pub resource_type: String,
    pub name: String,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ResourceHandle {
    pub fn new(id: impl Into<String>, declaration: &ResourceDeclaration) -> Self {
        Self {
            id: id.into(),
            resource_type: declaration.resource_type.clone(),
            name: declaration.name.clone(),
            properties: declaration.properties.clone(),
        }
    }

    pub fn get_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// The external system that turns declarations into real resources
///
/// Calls are awaited one at a time; an engine error is propagated to the
/// caller untouched and never retried.
#[async_trait]
pub trait ResourceEngine: Send + Sync {
    /// Engine name for logs (e.g., "memory", "hcloud-cli")
    fn name(&self) -> &str;

    /// Create the declared resource
    async fn create(&self, declaration: &ResourceDeclaration) -> Result<ResourceHandle>;
}

/// In-process engine that records declarations instead of creating anything
///
/// Used for dry runs and tests. Ids are derived from the resource type and
/// the creation order, e.g. `server-3`.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    declarations: Mutex<Vec<ResourceDeclaration>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// All declarations received so far, in order
    pub fn declarations(&self) -> Vec<ResourceDeclaration> {
        self.lock().clone()
    }

    /// Declarations of one resource type
    pub fn declarations_of(&self, resource_type: &str) -> Vec<ResourceDeclaration> {
        self.lock()
            .iter()
            .filter(|d| d.resource_type == resource_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ResourceDeclaration>> {
        self.declarations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ResourceEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, declaration: &ResourceDeclaration) -> Result<ResourceHandle> {
        let mut declarations = self.lock();
        declarations.push(declaration.clone());

        let kind = declaration
            .resource_type
            .rsplit(':')
            .next()
            .unwrap_or(&declaration.resource_type)
            .to_lowercase();
        let id = format!("{}-{}", kind, declarations.len());

        tracing::debug!(
            "Recorded {} {} as {}",
            declaration.resource_type,
            declaration.name,
            id
        );
        Ok(ResourceHandle::new(id, declaration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_engine_records_in_order() {
        let engine = MemoryEngine::new();

        let network = tokio_test::block_on(
            engine.create(
                &ResourceDeclaration::new("hcloud:Network", "network")
                    .with_property("ip_range", "10.0.0.0/16"),
            ),
        )
        .unwrap();
        let server = tokio_test::block_on(
            engine.create(&ResourceDeclaration::new("hcloud:Server", "n1")),
        )
        .unwrap();

        assert_eq!(network.id, "network-1");
        assert_eq!(server.id, "server-2");
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.declarations_of("hcloud:Server").len(), 1);
        assert_eq!(
            network.get_property::<String>("ip_range").as_deref(),
            Some("10.0.0.0/16")
        );
    }

    #[test]
    fn test_declaration_properties() {
        let declaration = ResourceDeclaration::new("scaleway:InstanceServer", "n3")
            .with_property("type", "DEV1-S")
            .with_property("tags", serde_json::json!(["env=prod"]));

        assert_eq!(declaration.property_str("type"), Some("DEV1-S"));
        assert_eq!(
            declaration.get_property::<Vec<String>>("tags"),
            Some(vec!["env=prod".to_string()])
        );
        assert_eq!(declaration.property_str("missing"), None);
    }
}
