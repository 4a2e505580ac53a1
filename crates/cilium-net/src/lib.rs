//! Top-level facade crate for cilium-net.
//!
//! Re-exports the common types and the daemon library so users can depend on a single crate.

pub mod common {
    pub use cilium_net_common::*;
}

pub mod daemon {
    pub use cilium_net_daemon::*;
}
