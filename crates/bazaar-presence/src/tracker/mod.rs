//! Presence registry and stats broadcaster.

mod state;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use bazaar_common::CountingPolicy;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::report::{Delivery, DeliveryReport};
use crate::snapshot::StatsSnapshot;

use state::{PresenceKey, TrackerState};

/// Process-wide registry of live clients and visit counters.
///
/// Construct one at startup and clone the handle into each connection
/// handler. All state resets when the last handle is dropped.
///
/// The lock is never held across a send. A broadcast captures the snapshot
/// and its targets, releases the lock, sends, then re-locks to drop the
/// connections that failed. Disconnects are therefore never blocked by a
/// slow broadcast.
#[derive(Clone)]
pub struct VisitTracker {
    policy: CountingPolicy,
    stats_page: Arc<str>,
    state: Arc<Mutex<TrackerState>>,
}

impl VisitTracker {
    pub fn new(policy: CountingPolicy, stats_page: impl Into<String>) -> Self {
        let stats_page: String = stats_page.into();
        Self {
            policy,
            stats_page: Arc::from(stats_page),
            state: Arc::new(Mutex::new(TrackerState::default())),
        }
    }

    pub fn policy(&self) -> CountingPolicy {
        self.policy
    }

    pub fn stats_page(&self) -> &str {
        &self.stats_page
    }

    /// Register `conn` as live and broadcast to everyone, `conn` included.
    pub async fn connect(&self, conn: &Connection) -> DeliveryReport {
        {
            let mut state = self.state.lock().await;
            let registration = state.register(self.policy, conn);
            if let Some(old) = &registration.replaced {
                debug!(
                    conn = conn.id().short(),
                    replaced = old.id().short(),
                    client = %conn.key(),
                    "Address already live, evicting older connection"
                );
                old.evict();
            }
            info!(
                conn = conn.id().short(),
                client = %conn.key(),
                counted = registration.counted,
                active = state.live_count(),
                total_visits = state.total_visits(),
                "Client connected"
            );
        }
        self.broadcast_stats().await
    }

    /// Remove `conn` and broadcast to whoever is left.
    ///
    /// Returns `None` without broadcasting when `conn` is not live, e.g. it
    /// was already removed after a failed send or displaced by a newer
    /// connection from the same address.
    pub async fn disconnect(&self, conn: &Connection) -> Option<DeliveryReport> {
        {
            let mut state = self.state.lock().await;
            let key = PresenceKey::for_connection(self.policy, conn);
            if !state.remove_if_current(&key, conn.id()) {
                debug!(conn = conn.id().short(), "Disconnect for connection not live");
                return None;
            }
            info!(
                conn = conn.id().short(),
                client = %conn.key(),
                active = state.live_count(),
                "Client disconnected"
            );
        }
        Some(self.broadcast_stats().await)
    }

    /// Push the current snapshot to every live connection.
    ///
    /// Connections whose send fails are removed once the pass is complete
    /// and marked evicted so their owner can close the socket.
    pub async fn broadcast_stats(&self) -> DeliveryReport {
        let (snapshot, targets) = {
            let state = self.state.lock().await;
            if state.is_empty() {
                return DeliveryReport::skipped();
            }
            (state.snapshot(&self.stats_page), state.targets())
        };

        let payload = match snapshot.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize stats snapshot");
                return DeliveryReport::skipped();
            }
        };

        let mut outcomes = Vec::with_capacity(targets.len());
        let mut failed = Vec::new();
        for (key, conn) in targets {
            match conn.send(&payload).await {
                Ok(()) => outcomes.push((conn.id().clone(), Delivery::Sent)),
                Err(e) => {
                    debug!(conn = conn.id().short(), error = %e, "Stats send failed");
                    outcomes.push((conn.id().clone(), Delivery::Failed(e)));
                    failed.push((key, conn));
                }
            }
        }

        if !failed.is_empty() {
            let mut state = self.state.lock().await;
            let mut removed = 0;
            for (key, conn) in &failed {
                if state.remove_if_current(key, conn.id()) {
                    conn.evict();
                    removed += 1;
                }
            }
            if removed > 0 {
                info!(
                    removed,
                    remaining = state.live_count(),
                    "Removed unreachable connections"
                );
            }
        }

        DeliveryReport {
            snapshot: Some(snapshot),
            outcomes,
        }
    }

    /// Count a view of `page`. Does not broadcast.
    pub async fn increment_page_view(&self, page: &str) -> u64 {
        self.state.lock().await.increment_page_view(page)
    }

    /// Count a view of `page` and broadcast the new stats.
    pub async fn record_page_view(&self, page: &str) -> DeliveryReport {
        let views = self.increment_page_view(page).await;
        debug!(page, views, "Page view");
        self.broadcast_stats().await
    }

    pub async fn get_page_views(&self, page: &str) -> u64 {
        self.state.lock().await.page_views(page)
    }

    pub async fn increment_total_visits(&self) -> u64 {
        self.state.lock().await.increment_total_visits()
    }

    pub async fn get_total_visits(&self) -> u64 {
        self.state.lock().await.total_visits()
    }

    pub async fn get_active_connections(&self) -> usize {
        self.state.lock().await.live_count()
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.state.lock().await.snapshot(&self.stats_page)
    }

    /// Number of distinct pages with a view counter.
    pub async fn tracked_pages(&self) -> usize {
        self.state.lock().await.tracked_pages()
    }
}
