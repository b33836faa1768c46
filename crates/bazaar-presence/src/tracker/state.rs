//! Registry state guarded by the tracker's lock. Nothing here awaits.

use std::collections::HashMap;

use bazaar_common::{ClientKey, ConnectionId, CountingPolicy};

use crate::connection::Connection;
use crate::snapshot::StatsSnapshot;

/// How a connection is filed in the presence set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PresenceKey {
    Connection(ConnectionId),
    Address(ClientKey),
}

impl PresenceKey {
    pub(crate) fn for_connection(policy: CountingPolicy, conn: &Connection) -> Self {
        match policy {
            CountingPolicy::PerConnect => Self::Connection(conn.id().clone()),
            CountingPolicy::UniqueAddress => Self::Address(conn.key().clone()),
        }
    }
}

/// Result of filing a new connection.
#[derive(Debug)]
pub(crate) struct Registration {
    pub counted: bool,
    /// Older connection displaced from the same address.
    pub replaced: Option<Connection>,
}

#[derive(Debug, Default)]
pub(crate) struct TrackerState {
    live: HashMap<PresenceKey, Connection>,
    total_visits: u64,
    page_views: HashMap<String, u64>,
}

impl TrackerState {
    pub(crate) fn register(&mut self, policy: CountingPolicy, conn: &Connection) -> Registration {
        let key = PresenceKey::for_connection(policy, conn);
        let counted = match policy {
            CountingPolicy::PerConnect => true,
            CountingPolicy::UniqueAddress => !self.live.contains_key(&key),
        };
        if counted {
            self.total_visits += 1;
        }
        let replaced = self
            .live
            .insert(key, conn.clone())
            .filter(|old| old.id() != conn.id());
        Registration { counted, replaced }
    }

    /// Remove `key` only while it still maps to connection `id`.
    pub(crate) fn remove_if_current(&mut self, key: &PresenceKey, id: &ConnectionId) -> bool {
        match self.live.get(key) {
            Some(current) if current.id() == id => {
                self.live.remove(key);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn targets(&self) -> Vec<(PresenceKey, Connection)> {
        self.live
            .iter()
            .map(|(key, conn)| (key.clone(), conn.clone()))
            .collect()
    }

    pub(crate) fn snapshot(&self, stats_page: &str) -> StatsSnapshot {
        StatsSnapshot {
            active_users: self.live.len(),
            total_visits: self.total_visits,
            page_views: self.page_views(stats_page),
        }
    }

    pub(crate) fn increment_total_visits(&mut self) -> u64 {
        self.total_visits += 1;
        self.total_visits
    }

    pub(crate) fn total_visits(&self) -> u64 {
        self.total_visits
    }

    pub(crate) fn increment_page_view(&mut self, page: &str) -> u64 {
        let count = self.page_views.entry(page.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub(crate) fn page_views(&self, page: &str) -> u64 {
        self.page_views.get(page).copied().unwrap_or(0)
    }

    pub(crate) fn tracked_pages(&self) -> usize {
        self.page_views.len()
    }
}
