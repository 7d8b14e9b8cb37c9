//! flexinfra cloud core
//!
//! This crate provides the provider-agnostic contract for flexinfra:
//! servers are described once and provisioned on any configured backend
//! through the same interface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                      Infra                      │
//! │        provision_server(server, "hetzner")      │
//! └─────────────────┬───────────────────────────────┘
//!                   │ dispatch by name
//! ┌─────────────────▼───────────────────────────────┐
//! │        dyn CloudProvider (Provider<B>)          │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │ tables · network · subnets · registry    │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │ B: Backend      │ ResourceEngine
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ hcloud /      │ │ memory / CLI  │
//! │ scaleway      │ │ engines       │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! A [`Provider`] is built in two phases: [`Provider::new`] only stores
//! configuration and fills the translation tables, [`Provider::initialize`]
//! provisions the private network and its subnets.

pub mod config;
pub mod engine;
pub mod error;
pub mod infra;
pub mod model;
pub mod provider;

// Re-exports
pub use config::{Cidr, NetworkConfig, ProviderConfig, SubnetConfig};
pub use engine::{MemoryEngine, ResourceDeclaration, ResourceEngine, ResourceHandle};
pub use error::{CloudError, Result};
pub use infra::Infra;
pub use model::{SecurityGroup, Server};
pub use provider::{
    Backend, Capabilities, CloudProvider, Provider, ProvisionedServer, ServerRequest,
    ServerResources, TranslationTable,
};
