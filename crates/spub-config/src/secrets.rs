//! Broker credential resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under
//!   `broker.credentials_env.{username,password}`.
//! - The daemon resolves them once at startup and hands the result to the
//!   MQTT adapter; nothing else reads the environment for credentials.
//! - `Debug` redacts the password. Errors name the env var, never the value.
//! - No `credentials_env` block means an anonymous broker session.

use std::fmt;

use anyhow::{bail, Result};

use crate::bridge::BridgeConfig;

/// Username/password pair resolved from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl BrokerCredentials {
    pub fn into_pair(self) -> (String, String) {
        (self.username, self.password)
    }
}

/// Resolve credentials from the process environment.
pub fn resolve_broker_credentials(cfg: &BridgeConfig) -> Result<Option<BrokerCredentials>> {
    resolve_broker_credentials_with(cfg, |name| std::env::var(name).ok())
}

/// Resolve credentials through `lookup` (env var name -> value).
///
/// Blank values count as unset.
pub fn resolve_broker_credentials_with<F>(
    cfg: &BridgeConfig,
    lookup: F,
) -> Result<Option<BrokerCredentials>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(names) = cfg.broker.credentials_env.as_ref() else {
        return Ok(None);
    };

    let resolve = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    let Some(username) = resolve(&names.username) else {
        bail!(
            "SECRETS_MISSING: env var '{}' (broker username) is not set or empty",
            names.username
        );
    };
    let Some(password) = resolve(&names.password) else {
        bail!(
            "SECRETS_MISSING: env var '{}' (broker password) is not set or empty",
            names.password
        );
    };

    Ok(Some(BrokerCredentials { username, password }))
}
