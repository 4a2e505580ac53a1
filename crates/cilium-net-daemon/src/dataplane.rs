//! Dataplane collaborator.
//!
//! The programs that enforce policy in the fast path live outside this crate.
//! The daemon only tells the dataplane which endpoints exist and asks it which
//! ones it currently has state for.

use async_trait::async_trait;

use cilium_net_common::error::Result;
use cilium_net_common::Endpoint;

#[async_trait]
pub trait Dataplane: Send + Sync {
    /// Install (or refresh) state for `endpoint`.
    async fn attach(&self, endpoint: &Endpoint) -> Result<()>;
    /// Remove state for endpoint `id`. Removing absent state is not an error.
    async fn detach(&self, id: &str) -> Result<()>;
    /// Endpoint ids with state under `path`.
    async fn list_attached(&self, path: &str) -> Result<Vec<String>>;
}

/// Dataplane that keeps no state. Used when nothing is wired in.
#[derive(Debug, Default)]
pub struct NoopDataplane;

#[async_trait]
impl Dataplane for NoopDataplane {
    async fn attach(&self, _endpoint: &Endpoint) -> Result<()> {
        Ok(())
    }

    async fn detach(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn list_attached(&self, _path: &str) -> Result<Vec<String>> {
        Ok(vec![])
    }
}
