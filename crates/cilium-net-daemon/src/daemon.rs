//! Shared daemon state and the `CiliumBackend` implementation.
//!
//! `Daemon` wires the identity store, endpoint registry, policy tree and IPAM
//! coordinator together and instruments every call with tracing and metrics.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use cilium_net_common::error::{Error, Missing, Result};
use cilium_net_common::{
    Endpoint, EpOpts, IpamConfigRep, IpamRep, IpamReq, IpamType, LabelDigest, Labels,
    PingResponse, PolicyNode, SearchContext, SearchContextReply, SecCtxLabel,
};

use crate::backend::{Control, EndpointBackend, IpamBackendApi, LabelBackend, PolicyBackend};
use crate::config::DaemonConfig;
use crate::dataplane::{Dataplane, NoopDataplane};
use crate::endpoint::EndpointRegistry;
use crate::identity::IdentityStore;
use crate::ipam::{DelegatedBackend, IpamCoordinator};
use crate::obs::metrics::outcome;
use crate::obs::DaemonMetrics;
use crate::policy::{PolicyEvaluator, PolicyTree};

#[derive(Clone)]
pub struct Daemon {
    inner: Arc<DaemonInner>,
}

struct DaemonInner {
    cfg: DaemonConfig,
    identities: Arc<IdentityStore>,
    endpoints: EndpointRegistry,
    policy: PolicyTree,
    evaluator: PolicyEvaluator,
    ipam: IpamCoordinator,
    dataplane: Arc<dyn Dataplane>,
    metrics: DaemonMetrics,
}

/// What a sync pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Attached in the dataplane but unknown to the registry.
    pub stale: Vec<String>,
    /// Registered but not attached in the dataplane.
    pub missing: Vec<String>,
}

impl Daemon {
    /// Build a daemon without a dataplane.
    pub fn new(cfg: DaemonConfig) -> Result<Self> {
        Self::with_dataplane(cfg, Arc::new(NoopDataplane))
    }

    pub fn with_dataplane(cfg: DaemonConfig, dataplane: Arc<dyn Dataplane>) -> Result<Self> {
        cfg.validate()?;

        let identities = Arc::new(IdentityStore::new(&cfg.identity));
        let endpoints = EndpointRegistry::new(Arc::clone(&identities));
        let evaluator = PolicyEvaluator::new(cfg.policy.allow_precedence);

        let ipam = IpamCoordinator::new();
        for ty in cfg.ipam.delegated_types() {
            ipam.register(Arc::new(DelegatedBackend::new(ty)));
        }

        tracing::info!(
            node_address = %cfg.daemon.node_address,
            min_id = cfg.identity.min_id,
            max_id = cfg.identity.max_id,
            allow_precedence = ?cfg.policy.allow_precedence,
            "daemon state initialized"
        );

        Ok(Self {
            inner: Arc::new(DaemonInner {
                cfg,
                identities,
                endpoints,
                policy: PolicyTree::new(),
                evaluator,
                ipam,
                dataplane,
                metrics: DaemonMetrics::default(),
            }),
        })
    }

    pub fn cfg(&self) -> &DaemonConfig {
        &self.inner.cfg
    }

    pub fn identities(&self) -> &IdentityStore {
        &self.inner.identities
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.inner.endpoints
    }

    pub fn policy(&self) -> &PolicyTree {
        &self.inner.policy
    }

    /// Where embedders register their allocator backends.
    pub fn ipam(&self) -> &IpamCoordinator {
        &self.inner.ipam
    }

    pub fn metrics(&self) -> &DaemonMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Compare dataplane state under `path` with the registry and, when
    /// `clean`, detach stale endpoints and re-attach missing ones.
    pub async fn reconcile(&self, path: &str, clean: bool) -> Result<SyncReport> {
        let attached = self.inner.dataplane.list_attached(path).await?;
        let attached_set: HashSet<&str> = attached.iter().map(String::as_str).collect();

        let mut report = SyncReport::default();
        for id in &attached {
            if !self.inner.endpoints.contains(id) {
                report.stale.push(id.clone());
            }
        }
        let mut missing: Vec<Endpoint> = self
            .inner
            .endpoints
            .list()
            .into_iter()
            .filter(|ep| !attached_set.contains(ep.id.as_str()))
            .collect();
        missing.sort_by(|a, b| a.id.cmp(&b.id));
        report.missing = missing.iter().map(|ep| ep.id.clone()).collect();

        if !clean {
            for id in &report.stale {
                tracing::warn!(path, endpoint = %id, "stale dataplane state");
            }
            for id in &report.missing {
                tracing::warn!(path, endpoint = %id, "endpoint missing from dataplane");
            }
            return Ok(report);
        }

        for id in &report.stale {
            self.inner.dataplane.detach(id).await?;
            tracing::info!(path, endpoint = %id, "stale dataplane state removed");
        }
        for ep in &missing {
            self.inner.dataplane.attach(ep).await?;
            tracing::info!(path, endpoint = %ep.id, "endpoint re-attached");
        }
        Ok(report)
    }

    fn observe_identities(&self, op: &str, result: &'static str) {
        let m = &self.inner.metrics;
        m.identity_ops.inc(&[("op", op), ("result", result)]);
        m.identities_active.set(self.inner.identities.len() as i64);
    }

    fn observe_endpoints(&self, op: &str, result: &'static str) {
        let m = &self.inner.metrics;
        m.endpoint_ops.inc(&[("op", op), ("result", result)]);
        m.endpoints_active.set(self.inner.endpoints.len() as i64);
        m.identities_active.set(self.inner.identities.len() as i64);
    }

    fn observe_policy(&self, op: &str, result: &'static str) {
        self.inner
            .metrics
            .policy_ops
            .inc(&[("op", op), ("result", result)]);
    }

    fn observe_ipam(&self, ty: &IpamType, op: &str, result: &'static str, started: Instant) {
        let m = &self.inner.metrics;
        m.ipam_requests
            .inc(&[("backend", ty.as_str()), ("op", op), ("result", result)]);
        m.ipam_duration
            .observe(&[("backend", ty.as_str()), ("op", op)], started.elapsed());
    }

    /// The endpoint is registered before the dataplane attach is awaited, so
    /// until the attach resolves it is already visible to `get`/`list` and can
    /// be removed by a concurrent leave. A failed attach then finds nothing to
    /// roll back.
    async fn join(&self, ep: Endpoint) -> Result<()> {
        let labels = ep.labels.clone();
        let stored = self.inner.endpoints.join(ep, labels)?;

        if let Err(e) = self.inner.dataplane.attach(&stored).await {
            tracing::warn!(endpoint = %stored.id, error = %e, "dataplane attach failed, rolling back join");
            match self.inner.endpoints.leave(&stored.id) {
                Ok(_) => {}
                Err(rb) if rb.is_not_found() => {
                    tracing::debug!(endpoint = %stored.id, "endpoint left before rollback");
                }
                Err(rb) => {
                    tracing::error!(endpoint = %stored.id, error = %rb, "join rollback failed");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Leave commits in the registry first. A failed detach leaves stale
    /// dataplane state behind for `sync_state` to report and clean.
    async fn leave(&self, id: &str) -> Result<()> {
        self.inner.endpoints.leave(id)?;
        if let Err(e) = self.inner.dataplane.detach(id).await {
            tracing::warn!(endpoint = %id, error = %e, "dataplane detach failed; state left for sync");
        }
        Ok(())
    }
}

#[async_trait]
impl EndpointBackend for Daemon {
    async fn endpoint_join(&self, ep: Endpoint) -> Result<()> {
        let res = self.join(ep).await;
        self.observe_endpoints("join", outcome(&res));
        res
    }

    async fn endpoint_leave(&self, id: &str) -> Result<()> {
        let res = self.leave(id).await;
        self.observe_endpoints("leave", outcome(&res));
        res
    }

    async fn endpoint_get(&self, id: &str) -> Result<Endpoint> {
        self.inner.endpoints.get(id)
    }

    async fn endpoints_get(&self) -> Result<Vec<Endpoint>> {
        Ok(self.inner.endpoints.list())
    }

    async fn endpoint_update(&self, id: &str, opts: EpOpts) -> Result<()> {
        let res = self.inner.endpoints.update(id, opts).map(|_| ());
        self.observe_endpoints("update", outcome(&res));
        res
    }
}

#[async_trait]
impl LabelBackend for Daemon {
    async fn put_labels(&self, labels: Labels) -> Result<(SecCtxLabel, bool)> {
        let res = self.inner.identities.resolve(&labels);
        self.observe_identities("put", outcome(&res));
        res
    }

    async fn get_labels(&self, id: u32) -> Result<SecCtxLabel> {
        self.inner.identities.lookup_by_uuid(id)
    }

    async fn get_labels_by_sha256(&self, digest: &str) -> Result<SecCtxLabel> {
        let d = LabelDigest::from_hex(digest)
            .ok_or_else(|| Error::NotFound(Missing::Digest(digest.to_string())))?;
        self.inner.identities.lookup_by_digest(&d)
    }

    async fn delete_labels_by_uuid(&self, id: u32) -> Result<()> {
        self.inner.identities.delete_by_uuid(id);
        self.observe_identities("delete", "ok");
        Ok(())
    }

    async fn delete_labels_by_sha256(&self, digest: &str) -> Result<()> {
        // A malformed digest cannot name a stored identity.
        if let Some(d) = LabelDigest::from_hex(digest) {
            self.inner.identities.delete_by_digest(&d);
        }
        self.observe_identities("delete", "ok");
        Ok(())
    }

    async fn get_max_id(&self) -> Result<u32> {
        Ok(self.inner.identities.max_uuid())
    }
}

#[async_trait]
impl PolicyBackend for Daemon {
    async fn policy_add(&self, path: &str, node: PolicyNode) -> Result<()> {
        let res = self.inner.policy.upsert(path, node);
        self.observe_policy("add", outcome(&res));
        res
    }

    async fn policy_delete(&self, path: &str) -> Result<()> {
        let res = self.inner.policy.delete(path);
        self.observe_policy("delete", outcome(&res));
        res
    }

    async fn policy_get(&self, path: &str) -> Result<PolicyNode> {
        let res = self.inner.policy.get(path);
        self.observe_policy("get", outcome(&res));
        res
    }

    async fn policy_can_consume(&self, ctx: SearchContext) -> Result<SearchContextReply> {
        let started = Instant::now();
        let snapshot = self.inner.policy.snapshot();
        let reply = self.inner.evaluator.can_consume(&snapshot, &ctx)?;

        let m = &self.inner.metrics;
        m.policy_decisions
            .inc(&[("decision", reply.decision.as_str())]);
        m.policy_eval_duration.observe(&[], started.elapsed());
        Ok(reply)
    }
}

#[async_trait]
impl IpamBackendApi for Daemon {
    async fn get_ipam_conf(&self, ty: IpamType, req: IpamReq) -> Result<IpamConfigRep> {
        let started = Instant::now();
        let res = self.inner.ipam.get_config(&ty, req).await;
        self.observe_ipam(&ty, "get_config", outcome(&res), started);
        res
    }

    async fn allocate_ip(&self, ty: IpamType, req: IpamReq) -> Result<Option<IpamRep>> {
        let started = Instant::now();
        let res = self.inner.ipam.allocate(&ty, req).await;
        self.observe_ipam(&ty, "allocate", outcome(&res), started);
        if let Err(e) = &res {
            tracing::warn!(ipam_type = %ty, error = %e, "IP allocation failed");
        }
        res
    }

    async fn release_ip(&self, ty: IpamType, req: IpamReq) -> Result<()> {
        let started = Instant::now();
        let res = self.inner.ipam.release(&ty, req).await;
        self.observe_ipam(&ty, "release", outcome(&res), started);
        res
    }
}

#[async_trait]
impl Control for Daemon {
    async fn ping(&self) -> Result<PingResponse> {
        Ok(PingResponse {
            node_address: self.inner.cfg.daemon.node_address.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    async fn sync_state(&self, path: &str, clean: bool) -> Result<()> {
        let report = self.reconcile(path, clean).await?;
        tracing::info!(
            path,
            clean,
            stale = report.stale.len(),
            missing = report.missing.len(),
            "state synced"
        );
        Ok(())
    }
}
