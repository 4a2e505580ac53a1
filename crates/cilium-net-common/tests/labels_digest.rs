//! Label parsing and content digests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use cilium_net_common::{Label, LabelDigest, Labels};

#[test]
fn digest_ignores_insertion_order() {
    let a: Labels = vec![Label::new("app", "web"), Label::new("env", "prod")]
        .into_iter()
        .collect();
    let b: Labels = vec![Label::new("env", "prod"), Label::new("app", "web")]
        .into_iter()
        .collect();

    assert_eq!(a, b);
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.normalized(), "app=web;env=prod;");
}

#[test]
fn digest_separates_distinct_sets() {
    let a: Labels = vec![("app", "web")].into_iter().collect();
    let b: Labels = vec![("app", "db")].into_iter().collect();
    let c: Labels = vec![("app", "web"), ("env", "")].into_iter().collect();
    assert_ne!(a.digest(), b.digest());
    assert_ne!(a.digest(), c.digest());
}

#[test]
fn delimiters_inside_labels_do_not_collide() {
    let packed: Labels = vec![("a", "b;c=d")].into_iter().collect();
    let split: Labels = vec![("a", "b"), ("c", "d")].into_iter().collect();
    assert_ne!(packed.normalized(), split.normalized());
    assert_ne!(packed.digest(), split.digest());
    assert_eq!(packed.normalized(), "a=b\\;c\\=d;");

    let key_eq: Labels = vec![("a=b", "c")].into_iter().collect();
    let val_eq: Labels = vec![("a", "b=c")].into_iter().collect();
    assert_ne!(key_eq.digest(), val_eq.digest());

    let trailing: Labels = vec![("a", "b\\")].into_iter().collect();
    let escaped: Labels = vec![("a", "b;")].into_iter().collect();
    assert_ne!(trailing.digest(), escaped.digest());
}

#[test]
fn digest_hex_parses_back() {
    let l: Labels = vec![("app", "web")].into_iter().collect();
    let d = l.digest();
    let hex = d.to_hex();
    assert_eq!(hex.len(), 64);
    assert_eq!(LabelDigest::from_hex(&hex), Some(d));
    assert_eq!(LabelDigest::from_hex("abc"), None);
    assert_eq!(LabelDigest::from_hex(&"zz".repeat(32)), None);
}

#[test]
fn label_parsing() {
    assert_eq!(Label::parse("app=web"), Label::new("app", "web"));
    assert_eq!(Label::parse("app"), Label::new("app", ""));
    assert_eq!(Label::parse("k=a=b"), Label::new("k", "a=b"));
    assert_eq!(Label::new("app", "").to_string(), "app");
    assert_eq!(Label::new("app", "web").to_string(), "app=web");
}

#[test]
fn key_only_selector_matches_any_value() {
    let l: Labels = vec![("app", "web")].into_iter().collect();
    assert!(l.matches(&Label::parse("app")));
    assert!(l.matches(&Label::parse("app=web")));
    assert!(!l.matches(&Label::parse("app=db")));
    assert!(!l.matches(&Label::parse("env")));
}

#[test]
fn labels_serialize_as_map() {
    let l: Labels = vec![("b", "2"), ("a", "1")].into_iter().collect();
    assert_eq!(serde_json::to_string(&l).unwrap(), r#"{"a":"1","b":"2"}"#);
}
