use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use cilium_net_common::error::{Error, Result};
use cilium_net_common::{IpamConfigRep, IpamRep, IpamReq, IpamType};

/// An allocator backend. Implementations may block on external systems.
///
/// Errors are surfaced to callers verbatim; use `Error::backend` to carry
/// the allocator's own message.
#[async_trait]
pub trait IpamBackend: Send + Sync {
    fn ipam_type(&self) -> IpamType;

    /// `Ok(None)` means the allocation is handled elsewhere.
    async fn allocate(&self, req: IpamReq) -> Result<Option<IpamRep>>;
    async fn release(&self, req: IpamReq) -> Result<()>;
    async fn get_config(&self, req: IpamReq) -> Result<IpamConfigRep>;
}

/// Registry of backends keyed by type name.
#[derive(Default)]
pub struct IpamCoordinator {
    backends: DashMap<IpamType, Arc<dyn IpamBackend>>,
}

impl IpamCoordinator {
    pub fn new() -> Self {
        Self {
            backends: DashMap::new(),
        }
    }

    /// Register a backend, replacing any backend of the same type.
    pub fn register(&self, backend: Arc<dyn IpamBackend>) {
        let ty = backend.ipam_type();
        if self.backends.insert(ty.clone(), backend).is_some() {
            tracing::warn!(ipam_type = %ty, "IPAM backend replaced");
        } else {
            tracing::info!(ipam_type = %ty, "IPAM backend registered");
        }
    }

    pub fn registered_types(&self) -> Vec<IpamType> {
        let mut out: Vec<IpamType> = self.backends.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }

    // Clone the handle out so no map guard is held across the backend call.
    fn backend(&self, ty: &IpamType) -> Result<Arc<dyn IpamBackend>> {
        self.backends
            .get(ty)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| Error::UnsupportedBackend(ty.clone()))
    }

    pub async fn allocate(&self, ty: &IpamType, req: IpamReq) -> Result<Option<IpamRep>> {
        let backend = self.backend(ty)?;
        let rep = backend.allocate(req).await?;
        if rep.is_none() {
            tracing::debug!(ipam_type = %ty, "allocation delegated, nothing to report");
        }
        Ok(rep)
    }

    pub async fn release(&self, ty: &IpamType, req: IpamReq) -> Result<()> {
        self.backend(ty)?.release(req).await
    }

    pub async fn get_config(&self, ty: &IpamType, req: IpamReq) -> Result<IpamConfigRep> {
        self.backend(ty)?.get_config(req).await
    }
}
