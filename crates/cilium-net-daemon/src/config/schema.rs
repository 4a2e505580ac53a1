use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;
use cilium_net_common::error::{Error, Result};
use cilium_net_common::IpamType;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    pub version: u32,

    #[serde(default)]
    pub daemon: DaemonSection,

    #[serde(default)]
    pub identity: IdentitySection,

    #[serde(default)]
    pub policy: PolicySection,

    #[serde(default)]
    pub ipam: IpamSection,
}

impl DaemonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::UnsupportedVersion);
        }

        self.daemon.validate()?;
        self.identity.validate()?;
        self.ipam.validate()?;

        Ok(())
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            version: 1,
            daemon: DaemonSection::default(),
            identity: IdentitySection::default(),
            policy: PolicySection::default(),
            ipam: IpamSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSection {
    #[serde(default = "default_node_address")]
    pub node_address: String,

    #[serde(default = "default_ops_listen")]
    pub ops_listen: String,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            node_address: default_node_address(),
            ops_listen: default_ops_listen(),
        }
    }
}

impl DaemonSection {
    pub fn validate(&self) -> Result<()> {
        if self.node_address.parse::<IpAddr>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "daemon.node_address must be an IP address, got {:?}",
                self.node_address
            )));
        }
        if self.ops_listen.parse::<SocketAddr>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "daemon.ops_listen must be a socket address, got {:?}",
                self.ops_listen
            )));
        }
        Ok(())
    }
}

fn default_node_address() -> String {
    "::1".into()
}
fn default_ops_listen() -> String {
    "127.0.0.1:9090".into()
}

/// Range of numeric identities the store may hand out.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySection {
    #[serde(default = "default_min_id")]
    pub min_id: u32,

    #[serde(default = "default_max_id")]
    pub max_id: u32,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            min_id: default_min_id(),
            max_id: default_max_id(),
        }
    }
}

impl IdentitySection {
    pub fn validate(&self) -> Result<()> {
        if self.min_id == 0 {
            return Err(Error::InvalidConfig("identity.min_id must be at least 1".into()));
        }
        if self.min_id > self.max_id {
            return Err(Error::InvalidConfig(
                "identity.min_id must not exceed identity.max_id".into(),
            ));
        }
        Ok(())
    }
}

fn default_min_id() -> u32 {
    1
}
fn default_max_id() -> u32 {
    u16::MAX as u32
}

/// How allows at different depths of the chain combine when nothing denies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowPrecedence {
    /// The deepest node with applicable rules decides.
    #[default]
    MostSpecific,
    /// Any matching allow on the chain is enough.
    Union,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    #[serde(default)]
    pub allow_precedence: AllowPrecedence,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpamSection {
    /// IPAM types answered by the built-in delegating backend.
    #[serde(default)]
    pub delegated: Vec<String>,
}

impl IpamSection {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in &self.delegated {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig("ipam.delegated entries must not be empty".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "ipam.delegated lists {name} more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn delegated_types(&self) -> impl Iterator<Item = IpamType> + '_ {
        self.delegated.iter().map(|s| IpamType::new(s.as_str()))
    }
}
