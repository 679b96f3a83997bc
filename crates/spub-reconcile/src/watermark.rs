//! Live-data timestamp watermark
//!
//! # Purpose
//!
//! Two producers deliver to the same ingest port at different cadences and
//! may race. The consumer treats each topic as last-write-wins, so an older
//! live reading arriving after a newer one would visibly regress a dashboard.
//! This module tracks the `dataTimestamp` of the last accepted live snapshot
//! and rejects anything not strictly newer.
//!
//! # Invariants
//!
//! - **Strictly increasing**: a snapshot is accepted only if no snapshot has
//!   been accepted yet, or its timestamp is > the last accepted one. Equal
//!   timestamps are duplicates and are rejected.
//! - **Watermark advances only on acceptance**: rejections do not move it.
//! - **Process lifetime**: starts empty, never reset, never persisted.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Freshness decision
// ---------------------------------------------------------------------------

/// Result of checking a live timestamp against the watermark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Strictly newer than the watermark (or the watermark is empty).
    Fresh,

    /// Equal to or older than the last accepted timestamp.
    Stale {
        /// The current watermark (last accepted `dataTimestamp`).
        watermark_ms: i64,
        /// The rejected snapshot's `dataTimestamp`.
        got_ms: i64,
    },
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The engine's only state: the last accepted live timestamp.
///
/// `Copy`, so [`crate::process`] can take it by value and hand back the
/// successor without any shared mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationState {
    last_accepted_ms: Option<i64>,
}

impl ReconciliationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check freshness **without** advancing the watermark.
    pub fn check(&self, timestamp_ms: i64) -> Freshness {
        match self.last_accepted_ms {
            Some(wm) if timestamp_ms <= wm => Freshness::Stale {
                watermark_ms: wm,
                got_ms: timestamp_ms,
            },
            _ => Freshness::Fresh,
        }
    }

    /// Check freshness and advance the watermark if fresh.
    pub fn accept(&mut self, timestamp_ms: i64) -> Freshness {
        let result = self.check(timestamp_ms);
        if result.is_fresh() {
            self.last_accepted_ms = Some(timestamp_ms);
        }
        result
    }

    /// `dataTimestamp` of the last accepted live snapshot, epoch ms.
    pub fn last_accepted_ms(&self) -> Option<i64> {
        self.last_accepted_ms
    }

    /// The last accepted timestamp as UTC wall time.
    ///
    /// `None` if nothing was accepted yet or the producer sent a timestamp
    /// outside chrono's range.
    pub fn last_accepted_at(&self) -> Option<DateTime<Utc>> {
        self.last_accepted_ms
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}
