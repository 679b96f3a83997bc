//! Response types for the spub-daemon status endpoints.
//!
//! No business logic lives here.

use serde::Serialize;
use spub_transport::ConnectionState;

use crate::state::BridgeStats;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub config_hash: String,
    /// `true` only while the broker session is up.
    pub broker_connected: bool,
    pub broker: ConnectionState,
    pub stats: BridgeStats,
}
