//! cilium-net daemon library entry.
//!
//! This crate holds the control-plane engines (identity store, policy tree
//! and evaluator, endpoint registry, IPAM coordinator) and wires them into
//! `Daemon`, which implements the `CiliumBackend` contract served to clients.
//! It is consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod backend;
pub mod config;
pub mod daemon;
pub mod dataplane;
pub mod endpoint;
pub mod identity;
pub mod ipam;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;

pub use backend::CiliumBackend;
pub use daemon::{Daemon, SyncReport};
