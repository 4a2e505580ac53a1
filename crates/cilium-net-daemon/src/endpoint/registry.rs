use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use cilium_net_common::error::{Error, ErrorKind, Missing, Result};
use cilium_net_common::{Endpoint, EpOpts, Labels};

use crate::identity::IdentityStore;

/// Endpoint registry: `endpoint id -> Endpoint`.
///
/// Every operation on one id runs under that id's map entry, so join/leave/
/// update on the same endpoint apply in the order they acquire it. The
/// identity store is only ever called while holding an entry, never the
/// other way round.
pub struct EndpointRegistry {
    endpoints: DashMap<String, Endpoint>,
    identities: Arc<IdentityStore>,
}

impl EndpointRegistry {
    pub fn new(identities: Arc<IdentityStore>) -> Self {
        Self {
            endpoints: DashMap::new(),
            identities,
        }
    }

    /// Bind `endpoint` to the identity for `labels` and register it.
    /// Returns the stored endpoint.
    pub fn join(&self, mut endpoint: Endpoint, labels: Labels) -> Result<Endpoint> {
        match self.endpoints.entry(endpoint.id.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateEndpoint(endpoint.id)),
            Entry::Vacant(slot) => {
                let (identity, created) = self.identities.resolve(&labels)?;
                endpoint.sec_label_id = identity.id;
                endpoint.labels = labels;
                tracing::info!(endpoint = %endpoint.id, identity = identity.id, created, "endpoint joined");
                slot.insert(endpoint.clone());
                Ok(endpoint)
            }
        }
    }

    /// Release the endpoint's identity and forget the endpoint.
    pub fn leave(&self, id: &str) -> Result<Endpoint> {
        let Entry::Occupied(slot) = self.endpoints.entry(id.to_string()) else {
            return Err(Error::NotFound(Missing::Endpoint(id.to_string())));
        };

        let identity = slot.get().sec_label_id;
        match self.identities.release(identity) {
            Ok(remaining) => {
                tracing::info!(endpoint = %id, identity, remaining, "endpoint left");
            }
            // An endpoint holds exactly one reference, so a retired or unknown
            // identity here was deleted administratively.
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::InvariantViolation) => {
                tracing::warn!(endpoint = %id, identity, error = %e, "endpoint left; identity already gone");
            }
            Err(e) => {
                tracing::error!(endpoint = %id, identity, error = %e, "identity release failed");
                return Err(e);
            }
        }
        Ok(slot.remove())
    }

    /// Merge `opts` into the endpoint's options. The identity binding is untouched.
    pub fn update(&self, id: &str, opts: EpOpts) -> Result<Endpoint> {
        let mut ep = self
            .endpoints
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(Missing::Endpoint(id.to_string())))?;
        ep.apply_opts(opts);
        tracing::debug!(endpoint = %id, "endpoint options updated");
        Ok(ep.clone())
    }

    pub fn get(&self, id: &str) -> Result<Endpoint> {
        self.endpoints
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::NotFound(Missing::Endpoint(id.to_string())))
    }

    /// Snapshot of all endpoints; order is unspecified.
    pub fn list(&self) -> Vec<Endpoint> {
        self.endpoints.iter().map(|r| r.value().clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.endpoints.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
