//! Hetzner Cloud provider for flexinfra
//!
//! This crate implements the [`Backend`](flexinfra_cloud::Backend) trait for
//! Hetzner Cloud, enabling flexinfra to provision private networks, subnets
//! and servers on Hetzner.
//!
//! # Features
//!
//! - Private network + `cloud` subnets in the `eu-central` network zone
//! - Servers attached to the private network at a caller-chosen address
//! - Server labels taken 1:1 from server tags
//!
//! # Requirements
//!
//! - `provider_config.location` must be set (e.g. `fsn1`)
//! - For real provisioning: the `hcloud` CLI installed with an active context
//!
//! # Example
//!
//! ```ignore
//! use flexinfra_cloud::{CloudProvider, NetworkConfig, ProviderConfig, Server};
//! use flexinfra_cloud_hcloud::{HCloudProvider, HcloudBackend, HcloudCli};
//! use std::sync::Arc;
//!
//! let config = ProviderConfig::new(
//!     NetworkConfig::new("10.0.0.0/16").with_subnet("web", "10.0.1.0/24"),
//! )
//! .with_location("fsn1");
//!
//! let engine = Arc::new(HcloudCli::new());
//! let mut provider = HCloudProvider::open(HcloudBackend, engine, vec![], config).await?;
//! provider
//!     .provision_server(Server::new("n1", "small", "ubuntu22").with_ip_address("10.0.1.5"))
//!     .await?;
//! ```

pub mod error;
pub mod hcloud;
pub mod provider;

pub use error::{HcloudError, Result};
pub use hcloud::HcloudCli;
pub use provider::{HCloudProvider, HcloudBackend};
