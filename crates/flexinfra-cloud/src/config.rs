//! Provider configuration
//!
//! Mirrors the `provider_config` block of the infrastructure file:
//!
//! ```yaml
//! location: fsn1
//! network_config:
//!   private_ip_range: 10.0.0.0/16
//!   subnets:
//!     - subnet_ip_range: 10.0.1.0/24
//!       name: web
//! ```

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Configuration handed to a provider at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Private network layout
    pub network_config: NetworkConfig,

    /// Region/zone code, only consulted by backends that use one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ProviderConfig {
    pub fn new(network_config: NetworkConfig) -> Self {
        Self {
            network_config,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Private network and its subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Main range of the private network (CIDR)
    pub private_ip_range: String,

    pub subnets: Vec<SubnetConfig>,
}

impl NetworkConfig {
    pub fn new(private_ip_range: impl Into<String>) -> Self {
        Self {
            private_ip_range: private_ip_range.into(),
            subnets: Vec::new(),
        }
    }

    pub fn with_subnet(mut self, name: impl Into<String>, subnet_ip_range: impl Into<String>) -> Self {
        self.subnets.push(SubnetConfig {
            subnet_ip_range: subnet_ip_range.into(),
            name: name.into(),
        });
        self
    }

    /// The subnet whose range contains `ip`
    pub fn subnet_containing(&self, ip: &IpAddr) -> Option<&SubnetConfig> {
        self.subnets.iter().find(|s| {
            s.subnet_ip_range
                .parse::<Cidr>()
                .is_ok_and(|range| range.contains_addr(ip))
        })
    }

    /// Check the layout before anything is provisioned
    ///
    /// The private range and every subnet range must be valid CIDRs, subnet
    /// names must be non-empty and unique, every subnet must sit inside the
    /// private range, and subnets must not overlap.
    pub fn validate(&self) -> Result<()> {
        let network: Cidr = self.private_ip_range.parse()?;
        let mut names = HashSet::new();
        let mut ranges: Vec<(&str, Cidr)> = Vec::with_capacity(self.subnets.len());

        for subnet in &self.subnets {
            if subnet.name.trim().is_empty() {
                return Err(CloudError::InvalidConfig(format!(
                    "subnet {} has an empty name",
                    subnet.subnet_ip_range
                )));
            }
            if !names.insert(subnet.name.as_str()) {
                return Err(CloudError::InvalidConfig(format!(
                    "duplicate subnet name: {}",
                    subnet.name
                )));
            }

            let range: Cidr = subnet.subnet_ip_range.parse()?;
            if !network.contains(&range) {
                return Err(CloudError::InvalidConfig(format!(
                    "subnet {} ({}) is outside the private range {}",
                    subnet.name, range, network
                )));
            }
            if let Some((other, _)) = ranges.iter().find(|(_, r)| r.overlaps(&range)) {
                return Err(CloudError::InvalidConfig(format!(
                    "subnet {} overlaps subnet {}",
                    subnet.name, other
                )));
            }
            ranges.push((subnet.name.as_str(), range));
        }

        Ok(())
    }
}

/// A single subnet inside the private network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetConfig {
    pub subnet_ip_range: String,
    pub name: String,
}

/// An IPv4 or IPv6 range in CIDR notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn width(&self) -> u8 {
        match self.addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    fn mask(&self) -> u128 {
        let width = self.width();
        if self.prefix == 0 {
            return 0;
        }
        let full = if width == 32 {
            u128::from(u32::MAX)
        } else {
            u128::MAX
        };
        (u128::MAX << (width - self.prefix)) & full
    }

    /// Whether `ip` falls inside this range
    pub fn contains_addr(&self, ip: &IpAddr) -> bool {
        if self.addr.is_ipv4() != ip.is_ipv4() {
            return false;
        }
        let mask = self.mask();
        bits(&self.addr) & mask == bits(ip) & mask
    }

    /// Whether `other` lies entirely inside this range
    pub fn contains(&self, other: &Cidr) -> bool {
        other.prefix >= self.prefix && self.contains_addr(&other.addr)
    }

    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }
}

fn bits(ip: &IpAddr) -> u128 {
    match ip {
        IpAddr::V4(a) => u128::from(u32::from(*a)),
        IpAddr::V6(a) => u128::from(*a),
    }
}

impl FromStr for Cidr {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CloudError::InvalidConfig(format!("invalid CIDR: {:?}", s));

        let (addr, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

        let cidr = Self { addr, prefix };
        if prefix > cidr.width() {
            return Err(invalid());
        }
        Ok(cidr)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}
