//! Per-connection outcome of a broadcast.

use bazaar_common::ConnectionId;

use crate::sink::SinkError;
use crate::snapshot::StatsSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed(SinkError),
}

/// What one broadcast did. `snapshot` is `None` when nothing was sent
/// because no connection was live.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub snapshot: Option<StatsSnapshot>,
    pub outcomes: Vec<(ConnectionId, Delivery)>,
}

impl DeliveryReport {
    pub(crate) fn skipped() -> Self {
        Self::default()
    }

    /// Number of send attempts made.
    pub fn attempts(&self) -> usize {
        self.outcomes.len()
    }

    pub fn sent_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, d)| matches!(d, Delivery::Sent))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ConnectionId> {
        self.outcomes.iter().filter_map(|(id, d)| match d {
            Delivery::Failed(_) => Some(id),
            Delivery::Sent => None,
        })
    }

    pub fn outcome(&self, id: &ConnectionId) -> Option<&Delivery> {
        self.outcomes
            .iter()
            .find(|(conn, _)| conn == id)
            .map(|(_, d)| d)
    }
}
