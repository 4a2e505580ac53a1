#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use cilium_net_common::ErrorKind;
use cilium_net_daemon::config::{self, AllowPrecedence};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
identity:
  min_id: 1
  maxid: 10 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "INVALID_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.identity.min_id, 1);
    assert_eq!(cfg.policy.allow_precedence, AllowPrecedence::MostSpecific);
    assert!(cfg.ipam.delegated.is_empty());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
daemon:
  node_address: "fd00::1"
  ops_listen: "0.0.0.0:9876"
identity:
  min_id: 256
  max_id: 4096
policy:
  allow_precedence: union
ipam:
  delegated: ["libnetwork"]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.daemon.node_address, "fd00::1");
    assert_eq!(cfg.identity.min_id, 256);
    assert_eq!(cfg.policy.allow_precedence, AllowPrecedence::Union);
    assert_eq!(cfg.ipam.delegated, vec!["libnetwork".to_string()]);
}

#[test]
fn wrong_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
}

#[test]
fn range_checks() {
    let cases = [
        "version: 1\nidentity: { min_id: 0 }\n",
        "version: 1\nidentity: { min_id: 10, max_id: 5 }\n",
        "version: 1\ndaemon: { node_address: \"not-an-ip\" }\n",
        "version: 1\ndaemon: { ops_listen: \"9090\" }\n",
        "version: 1\nipam: { delegated: [\"libnetwork\", \"libnetwork\"] }\n",
        "version: 1\nipam: { delegated: [\" \"] }\n",
        "version: 1\npolicy: { allow_precedence: newest }\n",
    ];
    for case in cases {
        let err = config::load_from_str(case).expect_err(case);
        assert_eq!(err.kind(), ErrorKind::InvalidConfig, "case={case}");
    }
}
