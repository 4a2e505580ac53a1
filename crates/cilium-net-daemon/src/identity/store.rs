use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use cilium_net_common::error::{Error, Missing, Result};
use cilium_net_common::{LabelDigest, Labels, SecCtxLabel};

use crate::config::IdentitySection;

/// Identity store: `digest -> uuid` and `uuid -> record` under one lock.
///
/// UUIDs are handed out monotonically from `min_id` and never reused, so any
/// id in `[min_id, high_water]` that is no longer live is retired. Releasing a
/// retired id is a bookkeeping bug rather than an unknown id.
pub struct IdentityStore {
    inner: Mutex<Inner>,
    min_id: u32,
    max_id: u32,
}

struct Inner {
    by_digest: HashMap<LabelDigest, u32>,
    by_uuid: BTreeMap<u32, SecCtxLabel>,
    next_id: u32,
    high_water: u32,
    exhausted: bool,
}

impl IdentityStore {
    pub fn new(cfg: &IdentitySection) -> Self {
        Self {
            inner: Mutex::new(Inner {
                by_digest: HashMap::new(),
                by_uuid: BTreeMap::new(),
                next_id: cfg.min_id,
                high_water: 0,
                exhausted: false,
            }),
            min_id: cfg.min_id,
            max_id: cfg.max_id,
        }
    }

    /// Find or create the identity for `labels`, taking one reference.
    /// Returns the record and whether it was created by this call.
    pub fn resolve(&self, labels: &Labels) -> Result<(SecCtxLabel, bool)> {
        let digest = labels.digest();
        let mut g = self.inner.lock();

        if let Some(id) = g.by_digest.get(&digest).copied() {
            if let Some(rec) = g.by_uuid.get_mut(&id) {
                rec.refcount += 1;
                tracing::debug!(id, refcount = rec.refcount, "identity reused");
                return Ok((rec.clone(), false));
            }
            return Err(Error::InvariantViolation(format!(
                "digest {digest} indexes missing identity {id}"
            )));
        }

        if g.exhausted {
            return Err(Error::AllocationError { max: self.max_id });
        }
        let id = g.next_id;
        if id >= self.max_id {
            g.exhausted = true;
        } else {
            g.next_id = id + 1;
        }
        g.high_water = id;

        let rec = SecCtxLabel {
            id,
            labels: labels.clone(),
            digest,
            refcount: 1,
        };
        g.by_digest.insert(digest, id);
        g.by_uuid.insert(id, rec.clone());
        tracing::info!(id, %digest, "identity allocated");
        Ok((rec, true))
    }

    pub fn lookup_by_uuid(&self, id: u32) -> Result<SecCtxLabel> {
        self.inner
            .lock()
            .by_uuid
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound(Missing::Identity(id)))
    }

    pub fn lookup_by_digest(&self, digest: &LabelDigest) -> Result<SecCtxLabel> {
        let g = self.inner.lock();
        g.by_digest
            .get(digest)
            .and_then(|id| g.by_uuid.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound(Missing::Digest(digest.to_hex())))
    }

    /// Drop one reference. The record goes away when the count reaches zero.
    /// Returns the remaining refcount.
    pub fn release(&self, id: u32) -> Result<u32> {
        let mut guard = self.inner.lock();
        let g = &mut *guard;
        let Some(rec) = g.by_uuid.get_mut(&id) else {
            if id >= self.min_id && id <= g.high_water {
                return Err(Error::InvariantViolation(format!(
                    "identity {id} is retired"
                )));
            }
            return Err(Error::NotFound(Missing::Identity(id)));
        };

        if rec.refcount == 0 {
            return Err(Error::InvariantViolation(format!(
                "identity {id} has zero refcount"
            )));
        }
        rec.refcount -= 1;
        let remaining = rec.refcount;
        if remaining == 0 {
            let digest = rec.digest;
            g.by_uuid.remove(&id);
            g.by_digest.remove(&digest);
            tracing::info!(id, "identity released");
        }
        Ok(remaining)
    }

    /// Forced removal regardless of refcount. Absent ids are fine.
    pub fn delete_by_uuid(&self, id: u32) -> bool {
        let mut g = self.inner.lock();
        match g.by_uuid.remove(&id) {
            Some(rec) => {
                g.by_digest.remove(&rec.digest);
                tracing::warn!(id, refcount = rec.refcount, "identity deleted administratively");
                true
            }
            None => false,
        }
    }

    pub fn delete_by_digest(&self, digest: &LabelDigest) -> bool {
        let mut g = self.inner.lock();
        match g.by_digest.remove(digest) {
            Some(id) => {
                let rec = g.by_uuid.remove(&id);
                tracing::warn!(id, refcount = rec.map(|r| r.refcount), "identity deleted administratively");
                true
            }
            None => false,
        }
    }

    /// Highest UUID ever handed out (0 before the first allocation).
    pub fn max_uuid(&self) -> u32 {
        self.inner.lock().high_water
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live records ordered by UUID.
    pub fn snapshot(&self) -> Vec<SecCtxLabel> {
        self.inner.lock().by_uuid.values().cloned().collect()
    }
}
