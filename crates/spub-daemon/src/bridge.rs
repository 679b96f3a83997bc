//! The bridge loop: ingest → normalize → reconcile → publish.
//!
//! # Invariants
//! - One datagram is fully handled before the next is received; arrival
//!   order is processing order.
//! - A parse failure touches neither the watermark nor the transport.
//! - A publish failure is counted and logged; the reconciliation decision
//!   for that datagram stands and the remaining instructions still go out.
//! - The loop ends on the shutdown future or when the source is exhausted.

use std::future::Future;
use std::sync::Arc;

use spub_normalizer::{normalize, ParseFailure};
use spub_reconcile::{LiveDecision, ReconcileReport, ReconciliationEngine};
use spub_schemas::TopicScheme;
use spub_transport::{IngestSource, Publisher, RawReading};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::state::BridgeStats;

/// What happened to one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum DatagramOutcome {
    /// Discarded before reconciliation.
    Rejected(ParseFailure),
    /// Reconciled; `published` instructions were queued, `failed` were not.
    Processed {
        live: LiveDecision,
        published: usize,
        failed: usize,
    },
}

impl DatagramOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, DatagramOutcome::Rejected(_))
    }
}

#[derive(Debug, Default)]
struct PublishTally {
    cloud_ok: usize,
    live_ok: usize,
    failed: usize,
}

/// Owns the reconciliation engine and the outbound publisher.
pub struct Bridge<P: Publisher> {
    engine: ReconciliationEngine,
    publisher: P,
    scheme: TopicScheme,
    stats: Arc<RwLock<BridgeStats>>,
}

impl<P: Publisher> Bridge<P> {
    pub fn new(publisher: P, scheme: TopicScheme, stats: Arc<RwLock<BridgeStats>>) -> Self {
        Self {
            engine: ReconciliationEngine::new(),
            publisher,
            scheme,
            stats,
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Handle one datagram end to end.
    pub async fn handle_datagram(&mut self, raw: &RawReading) -> DatagramOutcome {
        let snapshot = match normalize(&raw.payload) {
            Ok(s) => s,
            Err(failure) => {
                warn!(
                    reason = failure.reason(),
                    error = %failure,
                    source = ?raw.source,
                    payload = %raw.lossy_text(),
                    "datagram rejected"
                );
                self.stats.write().await.parse_failures.record(&failure);
                return DatagramOutcome::Rejected(failure);
            }
        };

        let report = self.engine.apply(&snapshot);
        match &report.live {
            LiveDecision::Accepted { timestamp_ms } => {
                debug!(timestamp_ms, live = report.live_count(), "live snapshot accepted");
            }
            LiveDecision::Stale {
                watermark_ms,
                got_ms,
            } => {
                debug!(watermark_ms, got_ms, source = ?raw.source, "stale live snapshot ignored");
            }
            LiveDecision::NotApplicable => {}
        }

        let tally = self.publish_report(&report);
        self.record(&report.live, &tally).await;

        DatagramOutcome::Processed {
            live: report.live,
            published: tally.cloud_ok + tally.live_ok,
            failed: tally.failed,
        }
    }

    fn publish_report(&self, report: &ReconcileReport) -> PublishTally {
        let mut tally = PublishTally::default();
        for instruction in &report.instructions {
            let topic = instruction.topic(&self.scheme);
            match self
                .publisher
                .publish(&topic, &instruction.payload, instruction.retained)
            {
                Ok(()) if instruction.metric.is_live() => tally.live_ok += 1,
                Ok(()) => tally.cloud_ok += 1,
                Err(e) => {
                    tally.failed += 1;
                    warn!(error = %e, topic = %topic, "publish failed");
                }
            }
        }
        tally
    }

    async fn record(&self, live: &LiveDecision, tally: &PublishTally) {
        let mut st = self.stats.write().await;
        match live {
            LiveDecision::Accepted { .. } => st.live_accepted += 1,
            LiveDecision::Stale { .. } => st.live_stale += 1,
            LiveDecision::NotApplicable => {}
        }
        st.cloud_published += tally.cloud_ok as u64;
        st.live_published += tally.live_ok as u64;
        st.publish_failures += tally.failed as u64;

        let wm = self.engine.state();
        st.last_accepted_ms = wm.last_accepted_ms();
        st.last_accepted_at = wm.last_accepted_at();
    }

    /// Receive and handle datagrams until `shutdown` resolves or the source
    /// is exhausted. Receive errors are logged and the loop continues.
    pub async fn run<S, F>(&mut self, source: &mut S, shutdown: F) -> BridgeStats
    where
        S: IngestSource + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested; leaving ingest loop");
                    break;
                }
                r = source.recv() => r,
            };

            match next {
                Ok(Some(raw)) => {
                    self.stats.write().await.datagrams_received += 1;
                    self.handle_datagram(&raw).await;
                }
                Ok(None) => {
                    info!("ingest source exhausted");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "datagram receive failed");
                    self.stats.write().await.recv_errors += 1;
                }
            }
        }
        self.stats.read().await.clone()
    }
}
