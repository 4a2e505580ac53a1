//! IPAM dispatch.
//!
//! Requests name their allocator backend by `IpamType`; the coordinator looks
//! the backend up by exact name and forwards the call, passing backend errors
//! through untouched.

pub mod coordinator;
pub mod delegated;

pub use coordinator::{IpamBackend, IpamCoordinator};
pub use delegated::DelegatedBackend;
