//! Consumption decisions: fail-closed default, deny precedence, both allow
//! precedence modes, coverage and tracing.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use cilium_net_common::{
    Decision, ErrorKind, Label, Labels, PolicyNode, PolicyRule, RuleAction, SearchContext,
    POLICY_PATH_LABEL,
};
use cilium_net_daemon::config::AllowPrecedence;
use cilium_net_daemon::policy::{PolicyEvaluator, PolicyTree};
use maplit::btreemap;

const BOTH: [AllowPrecedence; 2] = [AllowPrecedence::MostSpecific, AllowPrecedence::Union];

fn labels(s: &str) -> Labels {
    s.split(',').map(Label::parse).collect()
}

fn at(path: &str, extra: &str) -> Labels {
    let mut l = if extra.is_empty() { Labels::new() } else { labels(extra) };
    l.insert(Label::new(POLICY_PATH_LABEL, path));
    l
}

fn rules(rules: Vec<PolicyRule>) -> PolicyNode {
    PolicyNode::new(rules)
}

fn decide(p: AllowPrecedence, t: &PolicyTree, from: &str, to: Labels) -> Decision {
    PolicyEvaluator::new(p)
        .can_consume(&t.snapshot(), &SearchContext::new(labels(from), to))
        .unwrap()
        .decision
}

#[test]
fn fail_closed_without_rules() {
    let t = PolicyTree::new();
    t.upsert("/org/team", rules(vec![PolicyRule::allow([Label::parse("app=db")])]))
        .unwrap();

    for p in BOTH {
        assert_eq!(decide(p, &PolicyTree::new(), "app=web", at("/", "")), Decision::Deny);
        assert_eq!(decide(p, &t, "app=web", at("/org/team", "")), Decision::Deny);
    }
}

#[test]
fn descendant_deny_overrides_ancestor_allow() {
    let t = PolicyTree::new();
    t.upsert("/org/team", rules(vec![PolicyRule::allow([Label::parse("app=web")])]))
        .unwrap();
    t.upsert("/org/team/svc", rules(vec![PolicyRule::deny([Label::parse("app=web")])]))
        .unwrap();

    for p in BOTH {
        assert_eq!(decide(p, &t, "app=web", at("/org/team/svc", "")), Decision::Deny);
        assert_eq!(decide(p, &t, "app=web", at("/org/team", "")), Decision::Allow);
    }
}

#[test]
fn ancestor_deny_overrides_descendant_allow() {
    let t = PolicyTree::new();
    t.upsert("/org", rules(vec![PolicyRule::deny([Label::parse("env=dev")])]))
        .unwrap();
    t.upsert("/org/team", rules(vec![PolicyRule::allow([Label::parse("app=web")])]))
        .unwrap();

    for p in BOTH {
        assert_eq!(decide(p, &t, "app=web,env=dev", at("/org/team", "")), Decision::Deny);
        assert_eq!(decide(p, &t, "app=web,env=prod", at("/org/team", "")), Decision::Allow);
    }
}

#[test]
fn deny_after_allow_on_same_node() {
    let t = PolicyTree::new();
    t.upsert(
        "/org",
        rules(vec![
            PolicyRule::allow([Label::parse("app")]),
            PolicyRule::deny([Label::parse("app=web")]),
        ]),
    )
    .unwrap();

    for p in BOTH {
        assert_eq!(decide(p, &t, "app=web", at("/org", "")), Decision::Deny);
        assert_eq!(decide(p, &t, "app=db", at("/org", "")), Decision::Allow);
    }
}

#[test]
fn allow_precedence_modes_differ() {
    let t = PolicyTree::new();
    t.upsert("/org", rules(vec![PolicyRule::allow([Label::parse("app=web")])]))
        .unwrap();
    t.upsert("/org/team", rules(vec![PolicyRule::allow([Label::parse("app=db")])]))
        .unwrap();

    // The team node has its own applicable rules; under most-specific they replace /org's.
    assert_eq!(
        decide(AllowPrecedence::MostSpecific, &t, "app=web", at("/org/team", "")),
        Decision::Deny
    );
    assert_eq!(
        decide(AllowPrecedence::Union, &t, "app=web", at("/org/team", "")),
        Decision::Allow
    );

    for p in BOTH {
        assert_eq!(decide(p, &t, "app=db", at("/org/team", "")), Decision::Allow);
    }
}

#[test]
fn nodes_without_applicable_rules_inherit() {
    let t = PolicyTree::new();
    t.upsert("/org", rules(vec![PolicyRule::allow([Label::parse("app=web")])]))
        .unwrap();
    t.upsert(
        "/org/team",
        rules(vec![
            PolicyRule::allow([Label::parse("app=db")]).with_coverage([Label::parse("tier=db")])
        ]),
    )
    .unwrap();

    for p in BOTH {
        // Team's only rule does not cover a frontend destination.
        assert_eq!(decide(p, &t, "app=web", at("/org/team", "tier=fe")), Decision::Allow);
    }
    assert_eq!(
        decide(AllowPrecedence::MostSpecific, &t, "app=web", at("/org/team", "tier=db")),
        Decision::Deny
    );
}

#[test]
fn unknown_target_uses_deepest_existing_node() {
    let t = PolicyTree::new();
    t.upsert("/org", rules(vec![PolicyRule::allow([Label::parse("app=web")])]))
        .unwrap();

    for p in BOTH {
        assert_eq!(decide(p, &t, "app=web", at("/org/nope/deeper", "")), Decision::Allow);
    }
}

#[test]
fn unlabeled_destination_uses_root() {
    let t = PolicyTree::new();
    t.upsert("/", rules(vec![PolicyRule::allow(Vec::<Label>::new())])).unwrap();

    let to: Labels = btreemap! { "app" => "db" }.into();
    assert_eq!(decide(AllowPrecedence::MostSpecific, &t, "app=anything", to), Decision::Allow);
}

#[test]
fn malformed_target_path() {
    let t = PolicyTree::new();
    let ctx = SearchContext::new(labels("app=web"), at("org", ""));
    let err = PolicyEvaluator::default()
        .can_consume(&t.snapshot(), &ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPath);
}

#[test]
fn trace_reports_consulted_rules() {
    let t = PolicyTree::new();
    t.upsert("/org/team", rules(vec![PolicyRule::allow([Label::parse("app=web")])]))
        .unwrap();
    t.upsert(
        "/org/team/svc",
        rules(vec![
            PolicyRule::allow([Label::parse("app=db")]),
            PolicyRule::deny([Label::parse("app=web")]),
        ]),
    )
    .unwrap();

    let ctx = SearchContext::new(labels("app=web"), at("/org/team/svc", "")).traced();
    let reply = PolicyEvaluator::default().can_consume(&t.snapshot(), &ctx).unwrap();
    assert_eq!(reply.decision, Decision::Deny);

    let trace = reply.trace.expect("trace requested");
    let seen: Vec<_> = trace
        .consulted
        .iter()
        .map(|e| (e.path.as_str(), e.rule_index, e.matched))
        .collect();
    assert_eq!(
        seen,
        vec![("/org/team", 0, true), ("/org/team/svc", 0, false), ("/org/team/svc", 1, true)]
    );

    let decided = trace.decided_by.expect("deny rule decides");
    assert_eq!((decided.path.as_str(), decided.rule_index), ("/org/team/svc", 1));
    assert_eq!(decided.action, RuleAction::Deny);
}

#[test]
fn untraced_reply_and_default_deny_trace() {
    let t = PolicyTree::new();
    let reply = PolicyEvaluator::default()
        .can_consume(&t.snapshot(), &SearchContext::new(labels("app=web"), at("/", "")))
        .unwrap();
    assert!(reply.trace.is_none());

    let reply = PolicyEvaluator::default()
        .can_consume(
            &t.snapshot(),
            &SearchContext::new(labels("app=web"), at("/", "")).traced(),
        )
        .unwrap();
    let trace = reply.trace.unwrap();
    assert!(trace.consulted.is_empty());
    assert!(trace.decided_by.is_none());
}
