//! Scaleway provider for flexinfra
//!
//! This crate implements the [`Backend`](flexinfra_cloud::Backend) trait for
//! Scaleway, enabling flexinfra to provision VPCs, private networks and
//! instances on Scaleway.
//!
//! # Features
//!
//! - VPC with one private network per configured subnet
//! - Instances bound to a freshly allocated public IP
//!
//! Instances are **not** attached to the private networks created at
//! initialization (`supports_private_network = false`); a server's
//! `ip_address` is ignored on this backend.
//!
//! # Requirements
//!
//! - For real provisioning: the `scw` CLI installed and initialized
//!   (`scw init`)
//!
//! # Example
//!
//! ```ignore
//! use flexinfra_cloud::{CloudProvider, NetworkConfig, ProviderConfig, Server};
//! use flexinfra_cloud_scaleway::{ScalewayBackend, ScalewayProvider, ScwCli};
//! use std::sync::Arc;
//!
//! let config = ProviderConfig::new(
//!     NetworkConfig::new("10.0.0.0/16").with_subnet("web", "10.0.1.0/24"),
//! );
//!
//! let engine = Arc::new(ScwCli::new());
//! let mut provider = ScalewayProvider::open(ScalewayBackend, engine, vec![], config).await?;
//! provider
//!     .provision_server(Server::new("n3", "small", "ubuntu22"))
//!     .await?;
//! ```

pub mod error;
pub mod provider;
pub mod scw;

pub use error::{Result, ScalewayError};
pub use provider::{ScalewayBackend, ScalewayProvider};
pub use scw::ScwCli;
