//! Desired-resource entities
//!
//! A [`Server`] is written once and can be handed to any provider; the
//! symbolic `size` and `image` keys are translated per backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A virtual server to provision
///
/// Fields are read-only once built. Provisioning consumes the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Unique name within a deployment
    name: String,

    /// Symbolic tier (small, medium, large, xlarge)
    size: String,

    /// Symbolic distro id (ubuntu22, debian11, ...)
    image: String,

    /// Private address chosen by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,

    /// Passed through unchanged to the backend (labels/tags)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, String>,
}

impl Server {
    pub fn new(
        name: impl Into<String>,
        size: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
            image: image.into(),
            ip_address: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

/// A named, ordered set of firewall rules
///
/// Rule shape is backend-defined, so rules are kept as opaque JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub name: String,

    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

impl SecurityGroup {
    pub fn new(name: impl Into<String>, rules: Vec<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_builder() {
        let server = Server::new("n1", "small", "ubuntu22")
            .with_ip_address("10.0.1.5")
            .with_tag("env", "prod")
            .with_tags([("team", "infra")]);

        assert_eq!(server.name(), "n1");
        assert_eq!(server.size(), "small");
        assert_eq!(server.image(), "ubuntu22");
        assert_eq!(server.ip_address(), Some("10.0.1.5"));
        assert_eq!(server.tags().len(), 2);
        assert_eq!(server.tags()["env"], "prod");
    }

    #[test]
    fn test_server_deserialize_defaults() {
        let server: Server =
            serde_json::from_str(r#"{"name": "n3", "size": "small", "image": "ubuntu22"}"#)
                .unwrap();

        assert_eq!(server.ip_address(), None);
        assert!(server.tags().is_empty());
    }
}
