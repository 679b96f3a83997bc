use spub_normalizer::SensorSnapshot;
use spub_schemas::Metric;

use crate::format::{format_reading, round_dp};
use crate::watermark::{Freshness, ReconciliationState};
use crate::{LiveDecision, PublishInstruction, ReconcileReport};

/// Payload for a live reading, after the consumer's conventions are applied:
/// - `psum`, `batteryPower`: negate, then round to 1 dp (grid/battery flow polarity)
/// - `pac`: round to 2 dp, sign kept
/// - `familyLoadPower`, `eToday`: round to 1 dp
/// - `batteryCapacitySoc`: integer percent, already truncated by the normalizer
fn live_payload(metric: Metric, snap: &SensorSnapshot) -> Option<String> {
    match metric {
        Metric::BatteryCapacitySoc => snap.battery_capacity_soc.map(|v| v.to_string()),
        Metric::Psum => snap.psum.map(|v| format_reading(round_dp(-v, 1))),
        Metric::BatteryPower => snap.battery_power.map(|v| format_reading(round_dp(-v, 1))),
        Metric::Pac => snap.pac.map(|v| format_reading(round_dp(v, 2))),
        Metric::FamilyLoadPower => snap.family_load_power.map(|v| format_reading(round_dp(v, 1))),
        Metric::EToday => snap.e_today.map(|v| format_reading(round_dp(v, 1))),
        _ => None,
    }
}

/// Reconcile one snapshot against `state`, advancing it on acceptance.
///
/// 1) Cloud passthrough: every present cloud energy reading is emitted as-is,
///    in the datagram's own text when known. No dedupe, no timestamp comparison.
/// 2) Live gate: only when the snapshot carries `dataTimestamp` and at least
///    one live reading. Strictly newer → accept, advance, emit every present
///    live reading. Otherwise → reject, emit nothing, state untouched.
pub fn reconcile(snap: &SensorSnapshot, state: &mut ReconciliationState) -> ReconcileReport {
    let mut instructions: Vec<PublishInstruction> = Vec::new();

    // 1) Cloud energy passthrough
    for metric in Metric::CLOUD {
        if let Some(v) = snap.value(metric) {
            let payload = snap
                .cloud_payload(metric)
                .map_or_else(|| format_reading(v), str::to_string);
            instructions.push(PublishInstruction::state(metric, payload));
        }
    }

    // 2) Timestamp-gated live readings
    let live = match snap.data_timestamp_ms {
        Some(ts) if snap.has_live_data() => match state.accept(ts) {
            Freshness::Fresh => {
                for metric in Metric::LIVE {
                    if let Some(payload) = live_payload(metric, snap) {
                        instructions.push(PublishInstruction::state(metric, payload));
                    }
                }
                LiveDecision::Accepted { timestamp_ms: ts }
            }
            Freshness::Stale {
                watermark_ms,
                got_ms,
            } => LiveDecision::Stale {
                watermark_ms,
                got_ms,
            },
        },
        _ => LiveDecision::NotApplicable,
    };

    ReconcileReport { live, instructions }
}

/// Value-in, value-out form of [`reconcile`].
///
/// Rejected snapshots return `state` unchanged.
pub fn process(
    snap: &SensorSnapshot,
    mut state: ReconciliationState,
) -> (ReconciliationState, Vec<PublishInstruction>) {
    let report = reconcile(snap, &mut state);
    (state, report.instructions)
}

/// Single owner of the process-wide [`ReconciliationState`].
///
/// The ingest loop holds one of these; nothing else can reach the state.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    state: ReconciliationState,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, snap: &SensorSnapshot) -> ReconcileReport {
        reconcile(snap, &mut self.state)
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }
}
