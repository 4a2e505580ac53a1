use cilium_net_common::error::Result;
use cilium_net_common::{
    Decision, RuleAction, SearchContext, SearchContextReply, Trace, TraceEntry,
};

use crate::config::AllowPrecedence;

use super::tree::TreeSnapshot;

/// Answers "may `from` be consumed by `to`" against a tree snapshot.
///
/// Rules are walked from the root to the destination's boundary node. A
/// matching deny anywhere on the chain wins. Without a deny, the outcome is
/// decided by the allow precedence; with no matching allow it is deny.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator {
    precedence: AllowPrecedence,
}

impl PolicyEvaluator {
    pub fn new(precedence: AllowPrecedence) -> Self {
        Self { precedence }
    }

    pub fn precedence(&self) -> AllowPrecedence {
        self.precedence
    }

    pub fn can_consume(&self, tree: &TreeSnapshot, ctx: &SearchContext) -> Result<SearchContextReply> {
        let chain = tree.covering_chain(ctx.target_path())?;

        let mut consulted = Vec::new();
        let mut allowed_by: Option<TraceEntry> = None;

        for (path, node) in chain {
            let mut applicable = false;
            let mut level_allow: Option<TraceEntry> = None;

            for (i, rule) in node.rules.iter().enumerate() {
                if !rule.covers(&ctx.to) {
                    continue;
                }
                applicable = true;

                let entry = TraceEntry {
                    path: path.clone(),
                    rule_index: i,
                    action: rule.action,
                    matched: rule.matches_source(&ctx.from),
                };
                if ctx.trace {
                    consulted.push(entry.clone());
                }
                if !entry.matched {
                    continue;
                }

                match rule.action {
                    RuleAction::Deny => {
                        tracing::debug!(path = %entry.path, rule = i, "consumption denied");
                        return Ok(reply(Decision::Deny, ctx.trace, consulted, Some(entry)));
                    }
                    RuleAction::Allow => {
                        if level_allow.is_none() {
                            level_allow = Some(entry);
                        }
                    }
                }
            }

            match self.precedence {
                // A deeper node with applicable rules replaces broader allows.
                AllowPrecedence::MostSpecific => {
                    if applicable {
                        allowed_by = level_allow;
                    }
                }
                AllowPrecedence::Union => {
                    if allowed_by.is_none() {
                        allowed_by = level_allow;
                    }
                }
            }
        }

        let decision = if allowed_by.is_some() {
            Decision::Allow
        } else {
            Decision::Deny
        };
        tracing::debug!(decision = decision.as_str(), target = ctx.target_path(), "consumption evaluated");
        Ok(reply(decision, ctx.trace, consulted, allowed_by))
    }
}

fn reply(
    decision: Decision,
    traced: bool,
    consulted: Vec<TraceEntry>,
    decided_by: Option<TraceEntry>,
) -> SearchContextReply {
    SearchContextReply {
        decision,
        trace: traced.then(|| Trace {
            consulted,
            decided_by,
        }),
    }
}
