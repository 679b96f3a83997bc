use std::collections::BTreeMap;

use spub_schemas::Metric;

/// One datagram's `data` object, validated and typed.
///
/// Every reading is optional; which subset is present tells the engine which
/// producer sent it. Power values are kW, energy values kWh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Producer timestamp, epoch milliseconds.
    pub data_timestamp_ms: Option<i64>,

    // live producer
    pub battery_capacity_soc: Option<i64>,
    pub battery_power: Option<f64>,
    pub pac: Option<f64>,
    pub psum: Option<f64>,
    pub family_load_power: Option<f64>,
    pub e_today: Option<f64>,

    // cloud producer
    pub battery_today_charge_energy: Option<f64>,
    pub battery_today_discharge_energy: Option<f64>,
    pub grid_purchased_today_energy: Option<f64>,
    pub grid_sell_today_energy: Option<f64>,

    /// Source text of each present cloud reading (`5`, `"12.30"` → `12.30`).
    /// Cloud values are republished untouched, so the datagram's own
    /// rendering is kept next to the parsed number.
    pub cloud_text: BTreeMap<Metric, String>,
}

impl SensorSnapshot {
    /// Raw value of `metric` as carried in the datagram.
    ///
    /// `batteryCapacitySoc` is returned already truncated to its integer percent.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::BatteryCapacitySoc => self.battery_capacity_soc.map(|v| v as f64),
            Metric::BatteryPower => self.battery_power,
            Metric::Pac => self.pac,
            Metric::Psum => self.psum,
            Metric::FamilyLoadPower => self.family_load_power,
            Metric::EToday => self.e_today,
            Metric::BatteryTodayChargeEnergy => self.battery_today_charge_energy,
            Metric::BatteryTodayDischargeEnergy => self.battery_today_discharge_energy,
            Metric::GridPurchasedTodayEnergy => self.grid_purchased_today_energy,
            Metric::GridSellTodayEnergy => self.grid_sell_today_energy,
        }
    }

    /// Payload text for a cloud reading, if the datagram carried one.
    pub fn cloud_payload(&self, metric: Metric) -> Option<&str> {
        self.cloud_text.get(&metric).map(String::as_str)
    }

    pub fn has_live_data(&self) -> bool {
        Metric::LIVE.iter().any(|m| self.value(*m).is_some())
    }

    pub fn has_cloud_data(&self) -> bool {
        Metric::CLOUD.iter().any(|m| self.value(*m).is_some())
    }

    /// `true` when no reading at all is present (the timestamp alone does not count).
    pub fn is_empty(&self) -> bool {
        !self.has_live_data() && !self.has_cloud_data()
    }

    /// Metrics present in this snapshot, in [`Metric::ALL`] order.
    pub fn present_metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.value(*m).is_some())
            .collect()
    }
}
