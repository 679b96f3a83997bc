//! Datagram builders shaped like the two producers' output.
//!
//! The local Modbus poller sends `dataTimestamp` as a string of epoch
//! milliseconds alongside unit labels; the cloud relay sends only the daily
//! energy totals.

use serde_json::{json, Map, Value};
use spub_schemas::Metric;

/// Live field values used by [`live_datagram`].
pub const LIVE_FIELDS_SAMPLE: [(&str, f64); 6] = [
    ("batteryCapacitySoc", 87.0),
    ("batteryPower", 2.34),
    ("pac", 3.456),
    ("psum", -1.05),
    ("familyLoadPower", 0.87),
    ("eToday", 12.34),
];

/// A local-poller datagram carrying every live metric at `timestamp_ms`.
pub fn live_datagram(timestamp_ms: i64) -> Vec<u8> {
    let mut data = Map::new();
    data.insert("dataTimestamp".into(), json!(timestamp_ms.to_string()));
    for (field, v) in LIVE_FIELDS_SAMPLE {
        data.insert(field.into(), json!(v));
    }
    data.insert("pacStr".into(), json!("kW"));
    data.insert("eTodayStr".into(), json!("kWh"));
    encode(json!({ "success": true, "code": "0", "msg": "success", "data": data }))
}

/// A cloud-relay datagram with the given daily totals, no timestamp.
pub fn cloud_datagram(values: &[(Metric, f64)]) -> Vec<u8> {
    let mut data = Map::new();
    for (metric, v) in values {
        data.insert(metric.wire_field().into(), json!(v));
    }
    encode(json!({ "data": data }))
}

/// Arbitrary `data` fields, with an optional timestamp.
pub fn mixed_datagram(timestamp_ms: Option<i64>, fields: &[(&str, Value)]) -> Vec<u8> {
    let mut data = Map::new();
    if let Some(ts) = timestamp_ms {
        data.insert("dataTimestamp".into(), json!(ts.to_string()));
    }
    for (k, v) in fields {
        data.insert((*k).to_string(), v.clone());
    }
    encode(json!({ "data": data }))
}

fn encode(v: Value) -> Vec<u8> {
    // Serializing a Value built from json! cannot fail.
    serde_json::to_vec(&v).unwrap_or_default()
}
