//! Scenario: datagram normalization
//!
//! # Invariants under test
//!
//! 1. A local-producer packet (string timestamp, unit labels) parses into the
//!    six live readings.
//! 2. A cloud packet exposes the four energy readings alongside live ones.
//! 3. A cloud-only packet without a timestamp parses (no live data to gate).
//! 4. A live reading without `dataTimestamp` fails with `missing_timestamp`.
//! 5. A document with no known readings parses into an empty snapshot.
//! 6. Non-numeric readings fail with `type_mismatch` naming the field.
//! 7. Broken JSON fails with `malformed`.

use spub_normalizer::{normalize, ParseFailure, SensorSnapshot};
use spub_schemas::Metric;

const LOCAL_PACKET: &str = r#"{
    "code": "0",
    "data": {
        "storageBatteryCurrent": 1,
        "dataTimestamp": "1700000020000",
        "eToday": 12.34,
        "eTodayStr": "kW",
        "pac": 3.456,
        "pacStr": "kW",
        "batteryCapacitySoc": 87,
        "batteryPower": -1.05,
        "batteryPowerStr": "kW",
        "psum": 2.34,
        "psumStr": "kW",
        "familyLoadPower": 0.87,
        "familyLoadPowerStr": "kW"
    },
    "msg": "success",
    "success": true
}"#;

const CLOUD_PACKET: &str = r#"{
    "data": {
        "dataTimestamp": 1700000000000,
        "pac": 3.1,
        "eToday": 12.0,
        "batteryTodayChargeEnergy": 4.2,
        "batteryTodayDischargeEnergy": 1.3,
        "gridPurchasedTodayEnergy": "0.8",
        "gridSellTodayEnergy": 6.5
    }
}"#;

#[test]
fn local_packet_yields_live_readings() {
    let s = normalize(LOCAL_PACKET.as_bytes()).unwrap();
    assert_eq!(s.data_timestamp_ms, Some(1_700_000_020_000));
    assert_eq!(s.battery_capacity_soc, Some(87));
    assert_eq!(s.battery_power, Some(-1.05));
    assert_eq!(s.pac, Some(3.456));
    assert_eq!(s.psum, Some(2.34));
    assert_eq!(s.family_load_power, Some(0.87));
    assert_eq!(s.e_today, Some(12.34));
    assert!(s.has_live_data());
    assert!(!s.has_cloud_data());
}

#[test]
fn cloud_packet_yields_energy_readings() {
    let s = normalize(CLOUD_PACKET.as_bytes()).unwrap();
    assert_eq!(s.data_timestamp_ms, Some(1_700_000_000_000));
    assert_eq!(s.battery_today_charge_energy, Some(4.2));
    assert_eq!(s.battery_today_discharge_energy, Some(1.3));
    assert_eq!(s.grid_purchased_today_energy, Some(0.8));
    assert_eq!(s.grid_sell_today_energy, Some(6.5));
    assert!(s.has_cloud_data());
    assert!(s.has_live_data());
    assert_eq!(
        s.present_metrics(),
        vec![
            Metric::BatteryTodayChargeEnergy,
            Metric::BatteryTodayDischargeEnergy,
            Metric::GridPurchasedTodayEnergy,
            Metric::GridSellTodayEnergy,
            Metric::Pac,
            Metric::EToday,
        ]
    );
}

#[test]
fn cloud_only_packet_needs_no_timestamp() {
    let s = normalize(br#"{"data":{"gridSellTodayEnergy":6.5}}"#).unwrap();
    assert_eq!(s.data_timestamp_ms, None);
    assert_eq!(s.grid_sell_today_energy, Some(6.5));
    assert!(!s.has_live_data());
}

#[test]
fn live_reading_without_timestamp_is_rejected() {
    let err = normalize(br#"{"data":{"psum":1.0,"gridSellTodayEnergy":6.5}}"#).unwrap_err();
    assert_eq!(err, ParseFailure::MissingTimestamp);
    assert_eq!(err.reason(), "missing_timestamp");
}

#[test]
fn no_known_readings_is_empty_snapshot() {
    let s = normalize(br#"{"data":{"storageBatteryCurrent":1,"msg":"hi"}}"#).unwrap();
    assert!(s.is_empty());
    assert_eq!(s, SensorSnapshot::default());
}

#[test]
fn non_numeric_reading_is_type_mismatch() {
    let err = normalize(br#"{"data":{"dataTimestamp":"1","pac":"lots"}}"#).unwrap_err();
    match err {
        ParseFailure::TypeMismatch { field, raw } => {
            assert_eq!(field, "pac");
            assert_eq!(raw, "\"lots\"");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }

    let err = normalize(br#"{"data":{"gridSellTodayEnergy":null}}"#).unwrap_err();
    assert_eq!(err.reason(), "type_mismatch");

    let err = normalize(br#"{"data":{"dataTimestamp":"1","batteryCapacitySoc":true}}"#)
        .unwrap_err();
    assert_eq!(err.reason(), "type_mismatch");
}

#[test]
fn broken_json_is_malformed() {
    let err = normalize(br#"{"data":{"pac":1.0"#).unwrap_err();
    assert_eq!(err.reason(), "malformed");
    assert!(err.to_string().starts_with("malformed datagram: invalid json"));
}
