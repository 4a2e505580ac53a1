//! IPAM request/reply shapes exchanged with allocator backends.
//!
//! These are plain values: they serialize with serde and compare by value, so
//! a reply survives a trip across the daemon boundary unchanged.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// Name of an allocator backend. Dispatch is by exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpamType(Cow<'static, str>);

impl IpamType {
    /// Backend driven by a CNI-style caller.
    pub const CNI: IpamType = IpamType(Cow::Borrowed("cni-host-local"));
    /// Backend driven by a libnetwork-style caller.
    pub const LIBNETWORK: IpamType = IpamType(Cow::Borrowed("libnetwork"));

    pub fn new(name: impl Into<String>) -> Self {
        IpamType(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IpamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IpamType {
    fn from(s: &str) -> Self {
        IpamType::new(s)
    }
}

/// libnetwork `RequestPool` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPoolRequest {
    #[serde(default)]
    pub address_space: String,
    #[serde(default)]
    pub pool: String,
    #[serde(default)]
    pub sub_pool: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub v6: bool,
}

/// libnetwork `RequestAddress` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAddressRequest {
    pub pool_id: String,
    #[serde(default)]
    pub address: Option<IpAddr>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// libnetwork `ReleaseAddress` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAddressRequest {
    pub pool_id: String,
    pub address: IpAddr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamReq {
    #[serde(default)]
    pub container_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_pool: Option<RequestPoolRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_address: Option<RequestAddressRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_address: Option<ReleaseAddressRequest>,
}

impl IpamReq {
    pub fn for_container(id: impl Into<String>) -> Self {
        Self {
            container_id: id.into(),
            ..Default::default()
        }
    }
}

/// Route kind, serialized as `nexthop` or `connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Nexthop,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub destination: IpNet,
    #[serde(default)]
    pub next_hop: Option<IpAddr>,
    #[serde(rename = "type")]
    pub route_type: RouteType,
}

impl Route {
    /// A route without a next hop is directly connected.
    pub fn new(destination: IpNet, next_hop: Option<IpAddr>) -> Self {
        let route_type = if next_hop.is_some() {
            RouteType::Nexthop
        } else {
            RouteType::Connected
        };
        Self {
            destination,
            next_hop,
            route_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    pub gateway: IpAddr,
    #[serde(default)]
    pub ip: Option<IpNet>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// Per-request allocation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamRep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip4: Option<IpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip6: Option<IpConfig>,
}

/// Backend-wide configuration, independent of any one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamConfigRep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam_config: Option<IpamRep>,
}
