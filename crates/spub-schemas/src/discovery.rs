//! Home Assistant MQTT discovery documents.
//!
//! One retained config document per [`Metric`], published under
//! `<discovery_prefix>/<topic_leaf>/config`. Payloads are serialized from
//! fixed structs, so building the document twice yields identical bytes.

use serde::Serialize;

use crate::Metric;

/// Topic layout shared by state publications and discovery documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    /// Prefix for state topics, e.g. `solar` -> `solar/psum`.
    pub state_prefix: String,
    /// Prefix for discovery topics, e.g. `homeassistant/sensor/solar`.
    pub discovery_prefix: String,
    /// Seconds after which the consumer marks a sensor unavailable.
    pub expire_after_secs: u32,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            state_prefix: "solar".to_string(),
            discovery_prefix: "homeassistant/sensor/solar".to_string(),
            expire_after_secs: 600,
        }
    }
}

impl TopicScheme {
    pub fn state_topic(&self, metric: Metric) -> String {
        format!(
            "{}/{}",
            self.state_prefix.trim_end_matches('/'),
            metric.topic_leaf()
        )
    }

    pub fn discovery_topic(&self, metric: Metric) -> String {
        format!(
            "{}/{}/config",
            self.discovery_prefix.trim_end_matches('/'),
            metric.topic_leaf()
        )
    }
}

/// JSON body of one discovery document.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorDiscovery {
    pub name: &'static str,
    pub state_topic: String,
    pub device_class: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_display_precision: Option<u8>,
    pub platform: &'static str,
    pub unit_of_measurement: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'static str>,
    pub expire_after: u32,
    pub unique_id: String,
}

/// Static description of a metric, before topic layout is applied.
struct Descriptor {
    name: &'static str,
    device_class: &'static str,
    unit: &'static str,
    state_class: Option<&'static str>,
    precision: Option<u8>,
}

fn descriptor(metric: Metric) -> Descriptor {
    const POWER: (&str, &str, Option<&str>) = ("power", "kW", Some("measurement"));
    const ENERGY: (&str, &str, Option<&str>) = ("energy", "kWh", Some("total_increasing"));

    let (name, (device_class, unit, state_class), precision) = match metric {
        Metric::BatteryPower => ("Solar battery active power", POWER, Some(1)),
        Metric::BatteryCapacitySoc => ("Solar battery capacity", ("battery", "%", None), None),
        Metric::EToday => ("Solar generation today", ENERGY, Some(1)),
        Metric::FamilyLoadPower => ("House load power", POWER, Some(1)),
        Metric::Pac => ("Solar active power", POWER, Some(1)),
        Metric::Psum => ("Grid active power", POWER, Some(1)),
        Metric::BatteryTodayChargeEnergy => ("Solar battery charge", ENERGY, Some(1)),
        Metric::BatteryTodayDischargeEnergy => ("Solar battery discharge", ENERGY, Some(1)),
        Metric::GridPurchasedTodayEnergy => ("Grid import", ENERGY, Some(1)),
        Metric::GridSellTodayEnergy => ("Grid export", ENERGY, Some(1)),
    };

    Descriptor {
        name,
        device_class,
        unit,
        state_class,
        precision,
    }
}

impl SensorDiscovery {
    pub fn for_metric(metric: Metric, scheme: &TopicScheme) -> Self {
        let d = descriptor(metric);
        Self {
            name: d.name,
            state_topic: scheme.state_topic(metric),
            device_class: d.device_class,
            suggested_display_precision: d.precision,
            platform: "sensor",
            unit_of_measurement: d.unit,
            state_class: d.state_class,
            expire_after: scheme.expire_after_secs,
            unique_id: format!(
                "{}_{}",
                scheme.state_prefix.trim_end_matches('/').replace('/', "_"),
                metric.topic_leaf()
            ),
        }
    }
}

/// A discovery topic bound to its serialized JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub metric: Metric,
    pub topic: String,
    pub payload: String,
}

/// The full, immutable set of discovery documents (one per metric).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryDocument {
    records: Vec<DiscoveryRecord>,
}

impl DiscoveryDocument {
    pub fn build(scheme: &TopicScheme) -> Result<Self, serde_json::Error> {
        let mut records = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let body = SensorDiscovery::for_metric(metric, scheme);
            records.push(DiscoveryRecord {
                metric,
                topic: scheme.discovery_topic(metric),
                payload: serde_json::to_string(&body)?,
            });
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[DiscoveryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topics_match_consumer_layout() {
        let scheme = TopicScheme::default();
        assert_eq!(scheme.state_topic(Metric::EToday), "solar/etoday");
        assert_eq!(
            scheme.discovery_topic(Metric::GridSellTodayEnergy),
            "homeassistant/sensor/solar/gridSellTodayEnergy/config"
        );
    }

    #[test]
    fn battery_capacity_has_no_precision_or_state_class() {
        let body = SensorDiscovery::for_metric(Metric::BatteryCapacitySoc, &TopicScheme::default());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["unit_of_measurement"], "%");
        assert_eq!(json["device_class"], "battery");
        assert!(json.get("suggested_display_precision").is_none());
        assert!(json.get("state_class").is_none());
    }
}
