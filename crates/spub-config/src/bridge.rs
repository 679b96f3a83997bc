//! Typed view of the merged bridge config.
//!
//! Every field has a default so an empty config runs a bridge that matches
//! the stock setup: UDP on 0.0.0.0:52005, broker on localhost:1883, topics
//! under `solar/`.

use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spub_schemas::TopicScheme;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    pub ingest: IngestConfig,
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
    pub status: StatusConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub bind: SocketAddr,
    pub max_datagram: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 52005)),
            max_datagram: 1500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub qos: u8,
    pub connect_timeout_secs: u64,
    pub request_capacity: usize,
    pub reconnect: ReconnectConfig,
    /// Names of env vars holding broker credentials. Never the values.
    pub credentials_env: Option<CredentialsEnv>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "solar-publisher".to_string(),
            keep_alive_secs: 60,
            qos: 1,
            connect_timeout_secs: 10,
            request_capacity: 100,
            reconnect: ReconnectConfig::default(),
            credentials_env: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_ms: 1_000,
            max_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsEnv {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub state_prefix: String,
    pub discovery_prefix: String,
    pub expire_after_secs: u32,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            state_prefix: "solar".to_string(),
            discovery_prefix: "homeassistant/sensor/solar".to_string(),
            expire_after_secs: 600,
        }
    }
}

impl TopicsConfig {
    pub fn scheme(&self) -> TopicScheme {
        TopicScheme {
            state_prefix: self.state_prefix.clone(),
            discovery_prefix: self.discovery_prefix.clone(),
            expire_after_secs: self.expire_after_secs,
        }
    }
}

/// Optional local HTTP status endpoint. Off unless `bind` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatusConfig {
    pub bind: Option<SocketAddr>,
}

impl BridgeConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: BridgeConfig =
            serde_json::from_value(v.clone()).context("config does not match bridge schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would only fail later at connect or bind time.
    pub fn validate(&self) -> Result<()> {
        if self.broker.host.trim().is_empty() {
            bail!("CONFIG_INVALID: broker.host must not be empty");
        }
        if self.broker.client_id.trim().is_empty() {
            bail!("CONFIG_INVALID: broker.client_id must not be empty");
        }
        if self.broker.qos > 2 {
            bail!("CONFIG_INVALID: broker.qos must be 0, 1 or 2 (got {})", self.broker.qos);
        }
        if self.broker.reconnect.initial_ms == 0 {
            bail!("CONFIG_INVALID: broker.reconnect.initial_ms must be > 0");
        }
        if self.broker.reconnect.max_ms < self.broker.reconnect.initial_ms {
            bail!("CONFIG_INVALID: broker.reconnect.max_ms must be >= initial_ms");
        }
        if self.ingest.max_datagram == 0 || self.ingest.max_datagram > 65_507 {
            bail!(
                "CONFIG_INVALID: ingest.max_datagram must be in 1..=65507 (got {})",
                self.ingest.max_datagram
            );
        }
        for (name, v) in [
            ("topics.state_prefix", &self.topics.state_prefix),
            ("topics.discovery_prefix", &self.topics.discovery_prefix),
        ] {
            let t = v.trim_matches('/');
            if t.is_empty() {
                bail!("CONFIG_INVALID: {name} must not be empty");
            }
            if t.contains('+') || t.contains('#') {
                bail!("CONFIG_INVALID: {name} must not contain MQTT wildcards");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_stock_defaults() {
        let cfg = BridgeConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(cfg.ingest.bind.to_string(), "0.0.0.0:52005");
        assert_eq!(cfg.broker.client_id, "solar-publisher");
        assert_eq!(cfg.broker.qos, 1);
        assert_eq!(cfg.topics.expire_after_secs, 600);
        assert!(cfg.status.bind.is_none());
    }

    #[test]
    fn default_topics_match_default_scheme() {
        assert_eq!(TopicsConfig::default().scheme(), TopicScheme::default());
    }

    #[test]
    fn wildcard_prefix_is_rejected() {
        let v = serde_json::json!({ "topics": { "state_prefix": "solar/#" } });
        let err = BridgeConfig::from_json(&v).unwrap_err().to_string();
        assert!(err.contains("topics.state_prefix"));
    }

    #[test]
    fn qos_above_two_is_rejected() {
        let v = serde_json::json!({ "broker": { "qos": 3 } });
        assert!(BridgeConfig::from_json(&v).is_err());
    }
}
