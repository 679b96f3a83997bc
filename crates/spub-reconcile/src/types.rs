use spub_schemas::{Metric, TopicScheme};

/// One publication the transport should perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishInstruction {
    pub metric: Metric,
    /// Plain-text rendering of the value.
    pub payload: String,
    pub retained: bool,
}

impl PublishInstruction {
    pub fn state(metric: Metric, payload: impl Into<String>) -> Self {
        Self {
            metric,
            payload: payload.into(),
            retained: false,
        }
    }

    pub fn topic(&self, scheme: &TopicScheme) -> String {
        scheme.state_topic(self.metric)
    }
}

/// What the timestamp gate decided for the live half of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiveDecision {
    /// Strictly newer than anything seen; watermark advanced.
    Accepted { timestamp_ms: i64 },
    /// Equal to or older than the watermark; nothing changed.
    Stale { watermark_ms: i64, got_ms: i64 },
    /// No live readings (or no timestamp) in this snapshot; gate not consulted.
    NotApplicable,
}

impl LiveDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LiveDecision::Accepted { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, LiveDecision::Stale { .. })
    }
}

/// Full outcome of reconciling one snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    pub live: LiveDecision,
    /// Cloud passthrough instructions first, then accepted live ones.
    pub instructions: Vec<PublishInstruction>,
}

impl ReconcileReport {
    /// Number of instructions carrying cloud readings.
    pub fn cloud_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| !i.metric.is_live())
            .count()
    }

    /// Number of instructions carrying live readings.
    pub fn live_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.metric.is_live())
            .count()
    }
}
