//! Datagram → [`SensorSnapshot`] normalization.
//!
//! Rules:
//! - The payload must be UTF-8 text holding a JSON object with a nested
//!   `data` object. Anything else is [`ParseFailure::Malformed`].
//! - Each reading is extracted independently. A missing key is not an error.
//! - Numbers may arrive as JSON numbers or as strings holding a number (the
//!   local producer sends `dataTimestamp` as a string).
//! - If any live reading is present, `dataTimestamp` must be present and an
//!   integer, else [`ParseFailure::MissingTimestamp`]. Without live readings
//!   an unusable timestamp is dropped, not an error.
//! - Extra keys (`*Str` unit labels, `code`, `msg`, ...) are ignored.

use std::fmt;

use serde_json::{Map, Value};
use spub_schemas::{Metric, DATA_FIELD, TIMESTAMP_FIELD};

use crate::snapshot::SensorSnapshot;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a datagram could not be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// Not UTF-8, not JSON, or not shaped `{"data": {...}}`.
    Malformed { detail: String },
    /// Live readings present without a usable `dataTimestamp`.
    MissingTimestamp,
    /// A reading is present but is not convertible to its numeric kind.
    TypeMismatch { field: &'static str, raw: String },
}

impl ParseFailure {
    /// Stable short reason, used in logs and status counters.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseFailure::Malformed { .. } => "malformed",
            ParseFailure::MissingTimestamp => "missing_timestamp",
            ParseFailure::TypeMismatch { .. } => "type_mismatch",
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Malformed { detail } => write!(f, "malformed datagram: {detail}"),
            ParseFailure::MissingTimestamp => write!(
                f,
                "live readings present but '{TIMESTAMP_FIELD}' is missing or not an integer"
            ),
            ParseFailure::TypeMismatch { field, raw } => {
                write!(f, "field '{field}' is not numeric: {raw}")
            }
        }
    }
}

impl std::error::Error for ParseFailure {}

fn malformed(detail: impl Into<String>) -> ParseFailure {
    ParseFailure::Malformed {
        detail: detail.into(),
    }
}

// ---------------------------------------------------------------------------
// Numeric conversion
// ---------------------------------------------------------------------------

fn mismatch(field: &'static str, v: &Value) -> ParseFailure {
    ParseFailure::TypeMismatch {
        field,
        raw: v.to_string(),
    }
}

/// Convert a JSON value to a finite `f64`.
fn to_f64(field: &'static str, v: &Value) -> Result<f64, ParseFailure> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(mismatch(field, v)),
    }
}

/// Convert a JSON value to an integer by truncation toward zero.
fn to_truncated_i64(field: &'static str, v: &Value) -> Result<i64, ParseFailure> {
    if let Value::Number(n) = v {
        if let Some(i) = n.as_i64() {
            return Ok(i);
        }
    }
    let x = to_f64(field, v)?;
    if x < i64::MIN as f64 || x > i64::MAX as f64 {
        return Err(mismatch(field, v));
    }
    Ok(x.trunc() as i64)
}

/// Parse the producer timestamp. Strings must hold an integer; JSON numbers
/// with a fractional part are truncated.
fn to_timestamp_ms(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|x| x.is_finite() && *x >= i64::MIN as f64 && *x <= i64::MAX as f64)
                .map(|x| x.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn read_f64(data: &Map<String, Value>, metric: Metric) -> Result<Option<f64>, ParseFailure> {
    data.get(metric.wire_field())
        .map(|v| to_f64(metric.wire_field(), v))
        .transpose()
}

/// Text a reading is republished as: a number's own JSON form, or a
/// string's contents without the quotes.
fn source_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize one raw datagram payload.
///
/// Returns an empty snapshot (not an error) when the `data` object carries
/// none of the known readings.
pub fn normalize(raw: &[u8]) -> Result<SensorSnapshot, ParseFailure> {
    let text = std::str::from_utf8(raw).map_err(|e| malformed(format!("not utf-8: {e}")))?;
    let doc: Value =
        serde_json::from_str(text).map_err(|e| malformed(format!("invalid json: {e}")))?;

    let data = doc
        .as_object()
        .ok_or_else(|| malformed("top-level value is not an object"))?
        .get(DATA_FIELD)
        .ok_or_else(|| malformed(format!("missing '{DATA_FIELD}' object")))?
        .as_object()
        .ok_or_else(|| malformed(format!("'{DATA_FIELD}' is not an object")))?;

    let battery_capacity_soc = data
        .get(Metric::BatteryCapacitySoc.wire_field())
        .map(|v| to_truncated_i64(Metric::BatteryCapacitySoc.wire_field(), v))
        .transpose()?;

    let cloud_text = Metric::CLOUD
        .into_iter()
        .filter_map(|m| data.get(m.wire_field()).map(|v| (m, source_text(v))))
        .collect();

    let snap = SensorSnapshot {
        data_timestamp_ms: None,
        battery_capacity_soc,
        battery_power: read_f64(data, Metric::BatteryPower)?,
        pac: read_f64(data, Metric::Pac)?,
        psum: read_f64(data, Metric::Psum)?,
        family_load_power: read_f64(data, Metric::FamilyLoadPower)?,
        e_today: read_f64(data, Metric::EToday)?,
        battery_today_charge_energy: read_f64(data, Metric::BatteryTodayChargeEnergy)?,
        battery_today_discharge_energy: read_f64(data, Metric::BatteryTodayDischargeEnergy)?,
        grid_purchased_today_energy: read_f64(data, Metric::GridPurchasedTodayEnergy)?,
        grid_sell_today_energy: read_f64(data, Metric::GridSellTodayEnergy)?,
        cloud_text,
    };

    // The timestamp only gates live readings; a cloud-only datagram with an
    // unusable one still carries its energy totals.
    let data_timestamp_ms = data.get(TIMESTAMP_FIELD).and_then(to_timestamp_ms);

    if snap.has_live_data() && data_timestamp_ms.is_none() {
        return Err(ParseFailure::MissingTimestamp);
    }

    Ok(SensorSnapshot {
        data_timestamp_ms,
        ..snap
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> Result<SensorSnapshot, ParseFailure> {
        normalize(s.as_bytes())
    }

    #[test]
    fn timestamp_accepts_number_or_integer_string() {
        assert_eq!(to_timestamp_ms(&Value::from(1_700_000_000_000_i64)), Some(1_700_000_000_000));
        assert_eq!(to_timestamp_ms(&Value::from("1700000000000")), Some(1_700_000_000_000));
        assert_eq!(to_timestamp_ms(&Value::from(12.9)), Some(12));
        assert_eq!(to_timestamp_ms(&Value::from("12.9")), None);
        assert_eq!(to_timestamp_ms(&Value::Bool(true)), None);
    }

    #[test]
    fn non_finite_strings_are_rejected() {
        assert!(to_f64("pac", &Value::from("NaN")).is_err());
        assert!(to_f64("pac", &Value::from("inf")).is_err());
        assert_eq!(to_f64("pac", &Value::from(" 1.5 ")).unwrap(), 1.5);
    }

    #[test]
    fn soc_is_truncated() {
        let s = norm(r#"{"data":{"dataTimestamp":"1","batteryCapacitySoc":87.9}}"#).unwrap();
        assert_eq!(s.battery_capacity_soc, Some(87));
    }

    #[test]
    fn not_utf8_is_malformed() {
        let err = normalize(&[0x7b, 0xff, 0xfe, 0x7d]).unwrap_err();
        assert_eq!(err.reason(), "malformed");
    }

    #[test]
    fn data_must_be_object() {
        assert_eq!(norm(r#"{"data":[1,2]}"#).unwrap_err().reason(), "malformed");
        assert_eq!(norm(r#"{"code":"0"}"#).unwrap_err().reason(), "malformed");
        assert_eq!(norm(r#"[{"data":{}}]"#).unwrap_err().reason(), "malformed");
    }

    #[test]
    fn unusable_timestamp_without_live_data_is_ignored() {
        for ts in [r#""""#, "null", r#""soon""#] {
            let raw = format!(r#"{{"data":{{"dataTimestamp":{ts},"gridSellTodayEnergy":6.5}}}}"#);
            let s = norm(&raw).unwrap();
            assert_eq!(s.data_timestamp_ms, None, "timestamp {ts}");
            assert_eq!(s.grid_sell_today_energy, Some(6.5));
        }
    }

    #[test]
    fn cloud_readings_keep_their_source_text() {
        let s = norm(
            r#"{"data":{"gridSellTodayEnergy":5,"gridPurchasedTodayEnergy":"12.30","batteryTodayChargeEnergy":4.0}}"#,
        )
        .unwrap();
        assert_eq!(s.cloud_payload(Metric::GridSellTodayEnergy), Some("5"));
        assert_eq!(s.cloud_payload(Metric::GridPurchasedTodayEnergy), Some("12.30"));
        assert_eq!(s.cloud_payload(Metric::BatteryTodayChargeEnergy), Some("4.0"));
        assert_eq!(s.cloud_payload(Metric::BatteryTodayDischargeEnergy), None);
        assert_eq!(s.grid_purchased_today_energy, Some(12.3));
    }

    #[test]
    fn unusable_timestamp_with_live_data_is_missing_timestamp() {
        let err = norm(r#"{"data":{"dataTimestamp":"soon","pac":1.0}}"#).unwrap_err();
        assert_eq!(err, ParseFailure::MissingTimestamp);
    }
}
