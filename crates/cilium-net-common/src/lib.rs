//! cilium-net common: transport-agnostic value types and the shared error.
//!
//! Labels and security identities, policy nodes and evaluation requests,
//! endpoints, and the IPAM request/reply shapes live here so that the daemon,
//! its clients and test tooling agree on one set of contracts. The crate
//! carries no runtime dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here; every fallible
//! path surfaces as `Error`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod endpoint;
pub mod error;
pub mod ipam;
pub mod labels;
pub mod policy;

pub use endpoint::{Endpoint, EpOpts, PingResponse};
pub use error::{Error, ErrorKind, Missing, Result};
pub use ipam::{IpConfig, IpamConfigRep, IpamRep, IpamReq, IpamType, Route, RouteType};
pub use labels::{Label, LabelDigest, Labels, SecCtxLabel};
pub use policy::{
    Decision, PolicyNode, PolicyRule, RuleAction, SearchContext, SearchContextReply, Trace,
    TraceEntry, POLICY_PATH_LABEL,
};
