use async_trait::async_trait;

use cilium_net_common::error::Result;
use cilium_net_common::{IpamConfigRep, IpamRep, IpamReq, IpamType};

use super::IpamBackend;

/// Backend for callers that run their own allocator: nothing is allocated
/// here, releases always succeed, and the configuration is a fixed reply.
pub struct DelegatedBackend {
    ipam_type: IpamType,
    config: IpamConfigRep,
}

impl DelegatedBackend {
    pub fn new(ipam_type: IpamType) -> Self {
        Self {
            ipam_type,
            config: IpamConfigRep::default(),
        }
    }

    pub fn with_config(mut self, config: IpamConfigRep) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl IpamBackend for DelegatedBackend {
    fn ipam_type(&self) -> IpamType {
        self.ipam_type.clone()
    }

    async fn allocate(&self, req: IpamReq) -> Result<Option<IpamRep>> {
        tracing::debug!(ipam_type = %self.ipam_type, container = %req.container_id, "allocation delegated");
        Ok(None)
    }

    async fn release(&self, req: IpamReq) -> Result<()> {
        tracing::debug!(ipam_type = %self.ipam_type, container = %req.container_id, "release delegated");
        Ok(())
    }

    async fn get_config(&self, _req: IpamReq) -> Result<IpamConfigRep> {
        Ok(self.config.clone())
    }
}
