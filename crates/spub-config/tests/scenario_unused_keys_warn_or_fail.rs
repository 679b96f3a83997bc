//! Scenario: config leaves the bridge never reads are surfaced.
//!
//! GREEN when:
//! - Warn policy returns a report listing the unused leaves.
//! - Fail policy errors with CONFIG_UNUSED_KEYS.
//! - A config of only consumed keys is clean under both policies.

use spub_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const CLEAN: &str = r#"
ingest:
  bind: "0.0.0.0:52005"
broker:
  host: "localhost"
  reconnect:
    initial_ms: 500
    max_ms: 30000
topics:
  expire_after_secs: 600
status:
  bind: "127.0.0.1:8899"
"#;

const TYPO: &str = r#"
broker:
  hostname: "localhost"
topics:
  expire_after: 600
"#;

#[test]
fn clean_config_passes_both_policies() {
    let loaded = load_layered_yaml_from_strings(&[CLEAN]).unwrap();
    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .unwrap()
        .is_clean());
    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).is_ok());
}

#[test]
fn warn_policy_lists_unused_leaves() {
    let loaded = load_layered_yaml_from_strings(&[CLEAN, TYPO]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/broker/hostname".to_string(), "/topics/expire_after".to_string()]
    );
}

#[test]
fn fail_policy_errors() {
    let loaded = load_layered_yaml_from_strings(&[TYPO]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err()
        .to_string();
    assert!(err.contains("CONFIG_UNUSED_KEYS"));
    assert!(err.contains("/broker/hostname"));
}
