//! spub-schemas
//!
//! Shared vocabulary for the solar bridge: the fixed metric set, where each
//! metric comes from (live producer or cloud producer), and the discovery
//! documents announced for each metric.
//!
//! No IO. Everything here is a static table or a pure builder.

pub mod discovery;

pub use discovery::{DiscoveryDocument, DiscoveryRecord, SensorDiscovery, TopicScheme};

/// Which upstream producer carries a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// High-frequency (~20s) local producer. Timestamp gated.
    Live,
    /// Low-frequency (~5min) cloud producer. Forwarded on every arrival.
    Cloud,
}

/// The ten published metrics.
///
/// Declaration order is the order instructions are emitted in, and the order
/// discovery documents are announced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    BatteryTodayChargeEnergy,
    BatteryTodayDischargeEnergy,
    GridPurchasedTodayEnergy,
    GridSellTodayEnergy,
    BatteryCapacitySoc,
    BatteryPower,
    Pac,
    Psum,
    FamilyLoadPower,
    EToday,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::BatteryTodayChargeEnergy,
        Metric::BatteryTodayDischargeEnergy,
        Metric::GridPurchasedTodayEnergy,
        Metric::GridSellTodayEnergy,
        Metric::BatteryCapacitySoc,
        Metric::BatteryPower,
        Metric::Pac,
        Metric::Psum,
        Metric::FamilyLoadPower,
        Metric::EToday,
    ];

    pub const CLOUD: [Metric; 4] = [
        Metric::BatteryTodayChargeEnergy,
        Metric::BatteryTodayDischargeEnergy,
        Metric::GridPurchasedTodayEnergy,
        Metric::GridSellTodayEnergy,
    ];

    pub const LIVE: [Metric; 6] = [
        Metric::BatteryCapacitySoc,
        Metric::BatteryPower,
        Metric::Pac,
        Metric::Psum,
        Metric::FamilyLoadPower,
        Metric::EToday,
    ];

    /// Key inside the inbound `data` object (case-sensitive).
    pub fn wire_field(&self) -> &'static str {
        match self {
            Metric::BatteryTodayChargeEnergy => "batteryTodayChargeEnergy",
            Metric::BatteryTodayDischargeEnergy => "batteryTodayDischargeEnergy",
            Metric::GridPurchasedTodayEnergy => "gridPurchasedTodayEnergy",
            Metric::GridSellTodayEnergy => "gridSellTodayEnergy",
            Metric::BatteryCapacitySoc => "batteryCapacitySoc",
            Metric::BatteryPower => "batteryPower",
            Metric::Pac => "pac",
            Metric::Psum => "psum",
            Metric::FamilyLoadPower => "familyLoadPower",
            Metric::EToday => "eToday",
        }
    }

    /// Last topic segment the metric publishes under.
    ///
    /// Identical to the wire field except `eToday`, which the consumer has
    /// always known as `etoday`.
    pub fn topic_leaf(&self) -> &'static str {
        match self {
            Metric::EToday => "etoday",
            other => other.wire_field(),
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            Metric::BatteryTodayChargeEnergy
            | Metric::BatteryTodayDischargeEnergy
            | Metric::GridPurchasedTodayEnergy
            | Metric::GridSellTodayEnergy => Origin::Cloud,
            _ => Origin::Live,
        }
    }

    pub fn is_live(&self) -> bool {
        self.origin() == Origin::Live
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_field())
    }
}

/// Wire key of the producer timestamp (epoch milliseconds).
pub const TIMESTAMP_FIELD: &str = "dataTimestamp";

/// Top-level key wrapping the readings in every inbound document.
pub const DATA_FIELD: &str = "data";
