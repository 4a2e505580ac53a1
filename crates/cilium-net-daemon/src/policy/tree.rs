use std::sync::Arc;

use parking_lot::RwLock;

use cilium_net_common::error::{Error, Missing, Result};
use cilium_net_common::PolicyNode;

use super::path;

/// The policy namespace. One root; parents own their children.
#[derive(Default)]
pub struct PolicyTree {
    root: RwLock<Arc<PolicyNode>>,
}

/// Immutable point-in-time view of the tree.
#[derive(Clone)]
pub struct TreeSnapshot(Arc<PolicyNode>);

impl PolicyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot(self.root.read().clone())
    }

    /// Create or replace the node at `path`, creating missing ancestors empty.
    pub fn upsert(&self, path: &str, mut node: PolicyNode) -> Result<()> {
        let segs = path::segments(path)?;
        node.name = segs.last().map(|s| s.to_string()).unwrap_or_default();
        adopt_children(path, &mut node)?;

        let mut root = self.root.write();
        let mut cur = Arc::make_mut(&mut *root);
        for seg in &segs {
            cur = cur
                .children
                .entry(seg.to_string())
                .or_insert_with(|| PolicyNode {
                    name: seg.to_string(),
                    ..Default::default()
                });
        }
        *cur = node;
        tracing::info!(path = %path::join(&segs), "policy node stored");
        Ok(())
    }

    /// Remove the node at `path` with its whole subtree.
    pub fn delete(&self, path: &str) -> Result<()> {
        let segs = path::segments(path)?;
        let mut root = self.root.write();

        let Some((last, parents)) = segs.split_last() else {
            *root = Arc::new(PolicyNode::default());
            tracing::warn!("policy tree cleared");
            return Ok(());
        };

        // Check first so a miss does not force a copy of a shared root.
        if walk(&root, &segs).is_none() {
            return Err(not_found(&segs));
        }

        let mut cur = Arc::make_mut(&mut *root);
        for seg in parents {
            cur = cur
                .children
                .get_mut(*seg)
                .ok_or_else(|| not_found(&segs))?;
        }
        cur.children.remove(*last);
        tracing::info!(path = %path::join(&segs), "policy subtree deleted");
        Ok(())
    }

    pub fn get(&self, path: &str) -> Result<PolicyNode> {
        self.snapshot().get(path).cloned()
    }

    /// Nodes from the root down to `path`, inclusive.
    pub fn ancestors(&self, path: &str) -> Result<Vec<PolicyNode>> {
        let snap = self.snapshot();
        let chain = snap.ancestors(path)?;
        Ok(chain.into_iter().map(|(_, n)| n.clone()).collect())
    }
}

impl TreeSnapshot {
    pub fn root(&self) -> &PolicyNode {
        &self.0
    }

    pub fn get(&self, path: &str) -> Result<&PolicyNode> {
        let segs = path::segments(path)?;
        walk(&self.0, &segs).ok_or_else(|| not_found(&segs))
    }

    /// `(path, node)` pairs from the root to `path`; every node must exist.
    pub fn ancestors(&self, path: &str) -> Result<Vec<(String, &PolicyNode)>> {
        let segs = path::segments(path)?;
        let chain = self.chain(&segs);
        if chain.len() != segs.len() + 1 {
            return Err(not_found(&segs));
        }
        Ok(chain)
    }

    /// Like `ancestors`, but stops at the deepest node that exists.
    pub fn covering_chain(&self, path: &str) -> Result<Vec<(String, &PolicyNode)>> {
        let segs = path::segments(path)?;
        Ok(self.chain(&segs))
    }

    fn chain(&self, segs: &[&str]) -> Vec<(String, &PolicyNode)> {
        let mut out = vec![(path::ROOT.to_string(), &*self.0)];
        let mut cur: &PolicyNode = &self.0;
        for (depth, seg) in segs.iter().enumerate() {
            let Some(child) = cur.children.get(*seg) else { break };
            out.push((path::join(&segs[..=depth]), child));
            cur = child;
        }
        out
    }
}

fn walk<'a>(root: &'a PolicyNode, segs: &[&str]) -> Option<&'a PolicyNode> {
    let mut cur = root;
    for seg in segs {
        cur = cur.children.get(*seg)?;
    }
    Some(cur)
}

fn not_found(segs: &[&str]) -> Error {
    Error::NotFound(Missing::PolicyPath(path::join(segs)))
}

/// Validate nested child keys and make each child's name match its key.
fn adopt_children(path: &str, node: &mut PolicyNode) -> Result<()> {
    for (key, child) in node.children.iter_mut() {
        path::check_segment(path, key)?;
        child.name = key.clone();
        adopt_children(path, child)?;
    }
    Ok(())
}
