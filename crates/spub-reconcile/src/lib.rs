//! spub-reconcile
//!
//! Reconciliation Engine for the two solar producers.
//!
//! Architectural decisions:
//! - Cloud energy readings are forwarded on every arrival, never gated
//! - Live readings are gated on a strictly increasing producer timestamp
//! - A stale or duplicate live snapshot changes nothing and emits nothing
//! - State is an explicit value threaded through [`process`]; no globals
//!
//! Deterministic, pure logic. No IO. No broker calls.

mod engine;
mod format;
mod types;
mod watermark;

pub use engine::{process, reconcile, ReconciliationEngine};
pub use format::{format_reading, round_dp};
pub use types::*;
pub use watermark::{Freshness, ReconciliationState};
