//! Cloud provider error types

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid server {server}: {reason}")]
    InvalidServer { server: String, reason: String },

    #[error("Provider not found: {0}")]
    UnknownProvider(String),

    #[error("Not implemented yet: {0}")]
    NotImplementedYet(String),

    #[error("Provisioning {resource} failed: {source}")]
    BackendProvisioning {
        resource: String,
        #[source]
        source: BoxError,
    },

    #[error("{provider} does not support {capability}")]
    Unsupported { provider: String, capability: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider {0} is not initialized")]
    NotInitialized(String),

    #[error("Provider {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn invalid_server(server: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidServer {
            server: server.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure reported by the resource-provisioning engine
    pub fn backend(resource: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::BackendProvisioning {
            resource: resource.into(),
            source: source.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::Unsupported {
            provider: provider.into(),
            capability: capability.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
