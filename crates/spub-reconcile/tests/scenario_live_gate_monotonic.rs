//! Scenario: live readings only move forward in time.
//!
//! # Invariants under test
//!
//! 1. T1 < T2 processed in order: both accepted, state ends at T2.
//! 2. T2 then T1: T2 accepted, T1 rejected with zero live instructions and
//!    no state change, state ends at T2.
//! 3. A repeated timestamp is a duplicate and is rejected.
//! 4. A rejected snapshot still forwards its cloud readings.
//! 5. A partial live snapshot publishes only the readings it carries.
//!
//! All tests are pure in-process; no broker or socket required.

use spub_normalizer::SensorSnapshot;
use spub_reconcile::{process, reconcile, LiveDecision, ReconciliationState};
use spub_schemas::Metric;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn live_at(ts: i64, pac: f64) -> SensorSnapshot {
    SensorSnapshot {
        data_timestamp_ms: Some(ts),
        battery_capacity_soc: Some(80),
        battery_power: Some(0.5),
        pac: Some(pac),
        psum: Some(-1.0),
        family_load_power: Some(0.4),
        e_today: Some(10.0),
        ..Default::default()
    }
}

fn metrics(out: &[spub_reconcile::PublishInstruction]) -> Vec<Metric> {
    out.iter().map(|i| i.metric).collect()
}

// ---------------------------------------------------------------------------
// 1. In-order delivery
// ---------------------------------------------------------------------------

#[test]
fn in_order_snapshots_are_both_accepted() {
    let st = ReconciliationState::new();

    let (st, out1) = process(&live_at(1_000, 1.0), st);
    assert_eq!(out1.len(), 6);
    assert_eq!(st.last_accepted_ms(), Some(1_000));

    let (st, out2) = process(&live_at(2_000, 2.0), st);
    assert_eq!(out2.len(), 6);
    assert_eq!(st.last_accepted_ms(), Some(2_000));

    let pac = out2.iter().find(|i| i.metric == Metric::Pac).unwrap();
    assert_eq!(pac.payload, "2.0");
}

// ---------------------------------------------------------------------------
// 2. Out-of-order delivery
// ---------------------------------------------------------------------------

#[test]
fn older_snapshot_after_newer_is_rejected() {
    let st = ReconciliationState::new();

    let (st, out_new) = process(&live_at(2_000, 2.0), st);
    assert_eq!(out_new.len(), 6);

    let before = st;
    let (st, out_old) = process(&live_at(1_000, 1.0), st);
    assert!(out_old.is_empty(), "stale snapshot must emit nothing");
    assert_eq!(st, before, "stale snapshot must not change state");
    assert_eq!(st.last_accepted_ms(), Some(2_000));
}

#[test]
fn stale_decision_carries_evidence() {
    let mut st = ReconciliationState::new();
    reconcile(&live_at(2_000, 2.0), &mut st);

    let report = reconcile(&live_at(1_500, 1.0), &mut st);
    assert_eq!(
        report.live,
        LiveDecision::Stale {
            watermark_ms: 2_000,
            got_ms: 1_500
        }
    );
    assert_eq!(report.live_count(), 0);
}

// ---------------------------------------------------------------------------
// 3. Duplicates
// ---------------------------------------------------------------------------

#[test]
fn duplicate_timestamp_is_rejected() {
    let (st, _) = process(&live_at(5_000, 1.0), ReconciliationState::new());
    let (st, out) = process(&live_at(5_000, 9.0), st);
    assert!(out.is_empty());
    assert_eq!(st.last_accepted_ms(), Some(5_000));
}

// ---------------------------------------------------------------------------
// 4. Cloud readings survive a stale live half
// ---------------------------------------------------------------------------

#[test]
fn cloud_readings_forwarded_even_when_live_half_is_stale() {
    let st = ReconciliationState::new();

    let mut first = live_at(2_000, 1.0);
    first.grid_sell_today_energy = Some(5.0);
    let (st, out1) = process(&first, st);
    assert_eq!(out1.len(), 7);

    let mut second = live_at(1_000, 1.0);
    second.grid_sell_today_energy = Some(5.5);
    let (st, out2) = process(&second, st);

    assert_eq!(metrics(&out2), vec![Metric::GridSellTodayEnergy]);
    assert_eq!(out2[0].payload, "5.5");
    assert!(!out2[0].retained);
    assert_eq!(st.last_accepted_ms(), Some(2_000));
}

// ---------------------------------------------------------------------------
// 5. Partial live snapshots
// ---------------------------------------------------------------------------

#[test]
fn partial_live_snapshot_publishes_present_fields_only() {
    let snap = SensorSnapshot {
        data_timestamp_ms: Some(1),
        psum: Some(0.5),
        e_today: Some(3.04),
        ..Default::default()
    };
    let (st, out) = process(&snap, ReconciliationState::new());
    assert_eq!(metrics(&out), vec![Metric::Psum, Metric::EToday]);
    assert_eq!(out[0].payload, "-0.5");
    assert_eq!(out[1].payload, "3.0");
    assert_eq!(st.last_accepted_ms(), Some(1));
}
