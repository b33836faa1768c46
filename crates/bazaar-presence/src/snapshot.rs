use serde::{Deserialize, Serialize};

/// Stats pushed to every live client. Field names are the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub active_users: usize,
    pub total_visits: u64,
    /// View count of the configured stats page.
    pub page_views: u64,
}

impl StatsSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
