//! Policy tree nodes, consumer rules, and evaluation requests/replies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labels::{Label, Labels};

/// Destination label naming the policy node that acts as its consumer boundary.
pub const POLICY_PATH_LABEL: &str = "io.cilium.policy.path";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Deny,
}

/// One consumer rule.
///
/// The rule matches a source when every `from` selector matches it; an empty
/// `from` matches every source. `coverage` restricts which destinations under
/// the node the rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRule {
    pub action: RuleAction,
    #[serde(default)]
    pub from: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coverage: Vec<Label>,
}

impl PolicyRule {
    pub fn allow(from: impl IntoIterator<Item = Label>) -> Self {
        Self {
            action: RuleAction::Allow,
            from: from.into_iter().collect(),
            coverage: vec![],
        }
    }

    pub fn deny(from: impl IntoIterator<Item = Label>) -> Self {
        Self {
            action: RuleAction::Deny,
            from: from.into_iter().collect(),
            coverage: vec![],
        }
    }

    pub fn with_coverage(mut self, coverage: impl IntoIterator<Item = Label>) -> Self {
        self.coverage = coverage.into_iter().collect();
        self
    }

    /// Does this rule apply to traffic towards `to`?
    pub fn covers(&self, to: &Labels) -> bool {
        self.coverage.iter().all(|l| to.matches(l))
    }

    /// Does `from` satisfy every source selector?
    pub fn matches_source(&self, from: &Labels) -> bool {
        self.from.iter().all(|l| from.matches(l))
    }
}

/// A node of the policy namespace. Children are owned by their parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyNode {
    /// Last path segment; empty for the root.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    #[serde(default)]
    pub children: BTreeMap<String, PolicyNode>,
}

impl PolicyNode {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self {
            name: String::new(),
            rules,
            children: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, name: impl Into<String>, mut child: PolicyNode) -> Self {
        let name = name.into();
        child.name = name.clone();
        self.children.insert(name, child);
        self
    }
}

/// Evaluation request: may `from` be consumed by `to`?
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    pub from: Labels,
    pub to: Labels,
    #[serde(default)]
    pub trace: bool,
}

impl SearchContext {
    pub fn new(from: Labels, to: Labels) -> Self {
        Self {
            from,
            to,
            trace: false,
        }
    }

    pub fn traced(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Consumer boundary implied by the destination; root when unlabeled.
    pub fn target_path(&self) -> &str {
        self.to.get(POLICY_PATH_LABEL).unwrap_or("/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }
}

/// One rule the evaluator looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub path: String,
    pub rule_index: usize,
    pub action: RuleAction,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub consulted: Vec<TraceEntry>,
    /// Rule that produced the decision; `None` for the fail-closed default.
    pub decided_by: Option<TraceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContextReply {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
}

impl SearchContextReply {
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}
