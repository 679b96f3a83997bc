//! spub-config
//!
//! Layered YAML configuration for the bridge.
//!
//! - Docs merge in order: earlier docs are base, later docs override.
//! - The merged document is canonicalised to JSON and SHA-256 hashed so the
//!   effective config can be fingerprinted in startup logs.
//! - Secret-looking literals are refused; YAML names env vars instead (see
//!   [`secrets`]).
//! - Leaves the bridge never reads are reported (warn or fail).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

pub mod bridge;
pub mod secrets;

pub use bridge::{
    BridgeConfig, BrokerConfig, CredentialsEnv, IngestConfig, ReconnectConfig, StatusConfig,
    TopicsConfig,
};
pub use secrets::{resolve_broker_credentials, resolve_broker_credentials_with, BrokerCredentials};

/// Known secret-like prefixes. If any leaf string value in the effective
/// config starts with one of these, loading aborts with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

/// Keys whose presence anywhere means a credential was written inline.
const SECRET_KEYS: &[&str] = &["password", "passwd", "secret", "token"];

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

/// JSON-pointer prefixes the bridge actually reads.
///
/// Keep in step with [`bridge::BridgeConfig`]; a leaf not under any of these
/// is reported as unused.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/ingest/bind",
    "/ingest/max_datagram",
    "/broker/host",
    "/broker/port",
    "/broker/client_id",
    "/broker/keep_alive_secs",
    "/broker/qos",
    "/broker/connect_timeout_secs",
    "/broker/request_capacity",
    "/broker/reconnect",
    "/broker/credentials_env",
    "/topics/state_prefix",
    "/topics/discovery_prefix",
    "/topics/expire_after_secs",
    "/status/bind",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Produce an unused-key report.
/// If `policy == Fail`, returns an error when unused keys exist.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !CONSUMED_POINTERS.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. \
            Remove them or fix the spelling. First few: {}",
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

/// Return true if `prefix` is a JSON-pointer prefix of `leaf`.
///
/// "/a/b" consumes "/a/b" and "/a/b/c" but NOT "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            if !prefix.is_empty() {
                out.push(prefix.to_string());
            }
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view of the merged document (defaults fill absent keys).
    pub fn bridge(&self) -> Result<BridgeConfig> {
        BridgeConfig::from_json(&self.config_json)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        // An empty file is an empty layer, not a null that wipes the base.
        if raw.trim().is_empty() {
            continue;
        }
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json::Map is ordered by key, so this is stable across key order
    // in the source documents.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Env var listing config paths (comma-separated) when none are given on
/// the command line.
pub const ENV_CONFIG_PATHS: &str = "SPUB_CONFIG";

/// Resolve the config layers to load: explicit paths win, then
/// [`ENV_CONFIG_PATHS`], then none (all defaults).
pub fn config_paths(explicit: &[String], env_value: Option<&str>) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    env_value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Load the bridge config from `explicit` paths or the environment.
pub fn load_bridge_config(explicit: &[String]) -> Result<LoadedConfig> {
    let env_value = std::env::var(ENV_CONFIG_PATHS).ok();
    let paths = config_paths(explicit, env_value.as_deref());
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    load_layered_yaml(&refs)
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        let key = ptr.rsplit('/').next().unwrap_or_default().to_ascii_lowercase();
        let under_env_names = ptr.contains("/credentials_env/");
        if !under_env_names && SECRET_KEYS.iter().any(|k| key == *k) {
            bail!(
                "CONFIG_SECRET_DETECTED leaf={} value=REDACTED \
                 (name an env var under broker.credentials_env instead)",
                ptr
            );
        }
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pointer_respects_segment_boundary() {
        assert!(is_prefix_pointer("/broker/reconnect", "/broker/reconnect/max_ms"));
        assert!(is_prefix_pointer("/broker/host", "/broker/host"));
        assert!(!is_prefix_pointer("/broker/host", "/broker/hostname"));
    }

    #[test]
    fn explicit_paths_beat_env() {
        let explicit = vec!["a.yaml".to_string()];
        assert_eq!(config_paths(&explicit, Some("b.yaml")), explicit);
        assert_eq!(
            config_paths(&[], Some(" base.yaml, ,local.yaml ")),
            vec!["base.yaml".to_string(), "local.yaml".to_string()]
        );
        assert!(config_paths(&[], None).is_empty());
    }

    #[test]
    fn empty_layer_keeps_base() {
        let loaded = load_layered_yaml_from_strings(&["broker:\n  port: 1884\n", ""]).unwrap();
        assert_eq!(loaded.config_json["broker"]["port"], 1884);
    }

    #[test]
    fn inline_password_is_refused() {
        let err = load_layered_yaml_from_strings(&["broker:\n  password: hunter2\n"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CONFIG_SECRET_DETECTED"));
        assert!(!msg.contains("hunter2"));
    }

    #[test]
    fn env_var_name_for_password_is_allowed() {
        let yaml = "broker:\n  credentials_env:\n    username: SPUB_MQTT_USER\n    password: SPUB_MQTT_PASSWORD\n";
        assert!(load_layered_yaml_from_strings(&[yaml]).is_ok());
    }
}
