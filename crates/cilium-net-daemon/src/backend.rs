//! The aggregate backend contract consumed by the transport layer.

use async_trait::async_trait;

use cilium_net_common::error::Result;
use cilium_net_common::{
    Endpoint, EpOpts, IpamConfigRep, IpamRep, IpamReq, IpamType, Labels, PingResponse,
    PolicyNode, SearchContext, SearchContextReply, SecCtxLabel,
};

#[async_trait]
pub trait EndpointBackend: Send + Sync {
    async fn endpoint_join(&self, ep: Endpoint) -> Result<()>;
    async fn endpoint_leave(&self, id: &str) -> Result<()>;
    async fn endpoint_get(&self, id: &str) -> Result<Endpoint>;
    async fn endpoints_get(&self) -> Result<Vec<Endpoint>>;
    async fn endpoint_update(&self, id: &str, opts: EpOpts) -> Result<()>;
}

#[async_trait]
pub trait IpamBackendApi: Send + Sync {
    async fn get_ipam_conf(&self, ty: IpamType, req: IpamReq) -> Result<IpamConfigRep>;
    /// `Ok(None)` is a successful delegated allocation.
    async fn allocate_ip(&self, ty: IpamType, req: IpamReq) -> Result<Option<IpamRep>>;
    async fn release_ip(&self, ty: IpamType, req: IpamReq) -> Result<()>;
}

#[async_trait]
pub trait LabelBackend: Send + Sync {
    /// Returns the identity and whether it was newly created.
    async fn put_labels(&self, labels: Labels) -> Result<(SecCtxLabel, bool)>;
    async fn get_labels(&self, id: u32) -> Result<SecCtxLabel>;
    async fn get_labels_by_sha256(&self, digest: &str) -> Result<SecCtxLabel>;
    async fn delete_labels_by_uuid(&self, id: u32) -> Result<()>;
    async fn delete_labels_by_sha256(&self, digest: &str) -> Result<()>;
    async fn get_max_id(&self) -> Result<u32>;
}

#[async_trait]
pub trait PolicyBackend: Send + Sync {
    async fn policy_add(&self, path: &str, node: PolicyNode) -> Result<()>;
    async fn policy_delete(&self, path: &str) -> Result<()>;
    async fn policy_get(&self, path: &str) -> Result<PolicyNode>;
    async fn policy_can_consume(&self, ctx: SearchContext) -> Result<SearchContextReply>;
}

#[async_trait]
pub trait Control: Send + Sync {
    async fn ping(&self) -> Result<PingResponse>;
    /// Reconcile dataplane state rooted at `path`; `clean` removes stale state.
    async fn sync_state(&self, path: &str, clean: bool) -> Result<()>;
}

/// Everything the daemon serves, as one contract.
pub trait CiliumBackend:
    EndpointBackend + IpamBackendApi + LabelBackend + PolicyBackend + Control
{
}

impl<T> CiliumBackend for T where
    T: EndpointBackend + IpamBackendApi + LabelBackend + PolicyBackend + Control
{
}
