//! Shared runtime state for spub-daemon.
//!
//! The bridge loop is the only writer of [`BridgeStats`]; status handlers
//! read a clone. `AppState` is handed to Axum as `State<Arc<AppState>>`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spub_normalizer::ParseFailure;
use spub_transport::ConnectionState;
use tokio::sync::{watch, RwLock};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// BridgeStats
// ---------------------------------------------------------------------------

/// Parse failures split by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailureCounts {
    pub malformed: u64,
    pub missing_timestamp: u64,
    pub type_mismatch: u64,
}

impl ParseFailureCounts {
    pub fn record(&mut self, failure: &ParseFailure) {
        match failure {
            ParseFailure::Malformed { .. } => self.malformed += 1,
            ParseFailure::MissingTimestamp => self.missing_timestamp += 1,
            ParseFailure::TypeMismatch { .. } => self.type_mismatch += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.malformed + self.missing_timestamp + self.type_mismatch
    }
}

/// Running counters for the bridge loop. Reset only by restarting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    pub datagrams_received: u64,
    pub recv_errors: u64,
    pub parse_failures: ParseFailureCounts,
    /// Live snapshots that advanced the watermark.
    pub live_accepted: u64,
    /// Live snapshots at or behind the watermark.
    pub live_stale: u64,
    pub live_published: u64,
    pub cloud_published: u64,
    pub publish_failures: u64,
    pub last_accepted_ms: Option<i64>,
    pub last_accepted_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Static build metadata.
    pub build: BuildInfo,
    /// SHA-256 of the effective config.
    pub config_hash: String,
    /// Counters written by the bridge loop.
    pub stats: Arc<RwLock<BridgeStats>>,
    /// Broker session state from the MQTT event loop.
    pub connection: watch::Receiver<ConnectionState>,
}

impl AppState {
    pub fn new(
        config_hash: impl Into<String>,
        stats: Arc<RwLock<BridgeStats>>,
        connection: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            build: BuildInfo {
                service: "spub-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            config_hash: config_hash.into(),
            stats,
            connection,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}
