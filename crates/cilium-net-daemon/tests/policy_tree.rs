//! Policy tree: mkdir -p upserts, replacement, cascading deletes, paths.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use cilium_net_common::{ErrorKind, Label, PolicyNode, PolicyRule};
use cilium_net_daemon::policy::PolicyTree;

fn allow(l: &str) -> PolicyNode {
    PolicyNode::new(vec![PolicyRule::allow([Label::parse(l)])])
}

#[test]
fn upsert_creates_intermediate_nodes() {
    let t = PolicyTree::new();
    t.upsert("/org/team/svc", allow("app=web")).unwrap();

    let org = t.get("/org").unwrap();
    assert_eq!(org.name, "org");
    assert!(org.rules.is_empty());
    assert!(org.children.contains_key("team"));

    let svc = t.get("/org/team/svc").unwrap();
    assert_eq!(svc.name, "svc");
    assert_eq!(svc.rules.len(), 1);
}

#[test]
fn upsert_replaces_existing_node() {
    let t = PolicyTree::new();
    t.upsert("/org/team/svc", allow("app=web")).unwrap();
    t.upsert("/org/team", allow("app=db")).unwrap();

    // Replacement takes the new node wholesale, children included.
    let team = t.get("/org/team").unwrap();
    assert_eq!(team.rules[0].from, vec![Label::new("app", "db")]);
    assert_eq!(t.get("/org/team/svc").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn nested_children_are_named_by_key() {
    let t = PolicyTree::new();
    let node = PolicyNode::new(vec![]).with_child("svc", allow("app=web"));
    t.upsert("/org/", node).unwrap();

    assert_eq!(t.get("/org/svc").unwrap().name, "svc");
}

#[test]
fn delete_cascades() {
    let t = PolicyTree::new();
    t.upsert("/org/team/svc", allow("app=web")).unwrap();
    t.upsert("/org/team/svc/db", allow("app=web")).unwrap();
    t.upsert("/org/other", allow("app=web")).unwrap();

    t.delete("/org/team").unwrap();
    for p in ["/org/team", "/org/team/svc", "/org/team/svc/db"] {
        assert_eq!(t.get(p).unwrap_err().kind(), ErrorKind::NotFound, "path={p}");
    }
    assert!(t.get("/org/other").is_ok());

    assert_eq!(t.delete("/org/team").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn delete_root_clears_tree() {
    let t = PolicyTree::new();
    t.upsert("/", allow("app=web")).unwrap();
    t.upsert("/org", allow("app=web")).unwrap();

    t.delete("/").unwrap();
    let root = t.get("/").unwrap();
    assert!(root.rules.is_empty());
    assert!(root.children.is_empty());
}

#[test]
fn malformed_paths() {
    let t = PolicyTree::new();
    for p in ["", "org", "/org//team", "/org team", "/org/*"] {
        let err = t.upsert(p, PolicyNode::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath, "path={p:?}");
    }
    assert_eq!(t.get("relative").unwrap_err().kind(), ErrorKind::InvalidPath);
}

#[test]
fn ancestors_root_to_leaf() {
    let t = PolicyTree::new();
    t.upsert("/org/team", allow("app=web")).unwrap();

    let chain = t.ancestors("/org/team").unwrap();
    let names: Vec<_> = chain.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["", "org", "team"]);

    assert_eq!(t.ancestors("/org/nope").unwrap_err().kind(), ErrorKind::NotFound);

    let snap = t.snapshot();
    let covering = snap.covering_chain("/org/team/missing/deeper").unwrap();
    let paths: Vec<_> = covering.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["/", "/org", "/org/team"]);
}

#[test]
fn snapshots_are_isolated_from_writes() {
    let t = PolicyTree::new();
    t.upsert("/org/team", allow("app=web")).unwrap();

    let before = t.snapshot();
    t.delete("/org").unwrap();
    t.upsert("/other", allow("app=db")).unwrap();

    assert!(before.get("/org/team").is_ok());
    assert!(before.get("/other").is_err());
    assert!(t.get("/org/team").is_err());
}

#[test]
fn concurrent_writers_and_readers() {
    let t = Arc::new(PolicyTree::new());
    let writers: Vec<_> = (0..4)
        .map(|i| {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                for j in 0..50 {
                    let path = format!("/w{i}/n{j}");
                    t.upsert(&path, allow("app=web")).unwrap();
                    if j % 2 == 0 {
                        t.delete(&path).unwrap();
                    }
                }
            })
        })
        .collect();
    let reader = {
        let t = Arc::clone(&t);
        thread::spawn(move || {
            for _ in 0..200 {
                let snap = t.snapshot();
                let chain = snap.covering_chain("/w0/n1").unwrap();
                for pair in chain.windows(2) {
                    assert!(pair[1].0.starts_with(pair[0].0.trim_end_matches('/')));
                }
            }
        })
    };
    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    for i in 0..4 {
        let w = t.get(&format!("/w{i}")).unwrap();
        assert_eq!(w.children.len(), 25);
    }
}
