use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bazaar_common::{ClientKey, CountingPolicy};
use tokio::sync::{mpsc, Notify};

use super::*;
use crate::sink::{SinkError, StatsSink};

fn channel_conn(ip: &str) -> (Connection, mpsc::Receiver<String>) {
    Connection::channel(ClientKey::new(ip), 16)
}

fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<StatsSnapshot> {
    let mut out = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        out.push(serde_json::from_str(&payload).unwrap());
    }
    out
}

/// Counts attempts and succeeds.
#[derive(Default)]
struct CountingSink {
    attempts: AtomicUsize,
}

#[async_trait]
impl StatsSink for CountingSink {
    async fn send_stats(&self, _payload: &str) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Once armed, parks inside the send until released, then fails.
#[derive(Default)]
struct GateSink {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl StatsSink for GateSink {
    async fn send_stats(&self, _payload: &str) -> Result<(), SinkError> {
        if !self.armed.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.entered.notify_one();
        self.release.notified().await;
        Err(SinkError::Transport("connection reset".into()))
    }
}

#[tokio::test]
async fn connect_broadcasts_to_new_connection() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (conn, mut rx) = channel_conn("10.0.0.1");

    let report = tracker.connect(&conn).await;
    assert_eq!(report.sent_count(), 1);
    assert_eq!(report.outcome(conn.id()), Some(&Delivery::Sent));

    let received = drain(&mut rx);
    assert_eq!(received.len(), 1);
    assert!(received[0].active_users >= 1);
    assert_eq!(received[0].total_visits, 1);
}

#[tokio::test]
async fn broadcast_with_no_connections_is_noop() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let report = tracker.broadcast_stats().await;
    assert_eq!(report.attempts(), 0);
    assert!(report.snapshot.is_none());
}

#[tokio::test]
async fn broadcast_reaches_every_live_connection() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let sink = Arc::new(CountingSink::default());
    let a = Connection::new(ClientKey::new("10.0.0.1"), sink.clone());
    let b = Connection::new(ClientKey::new("10.0.0.2"), sink.clone());

    tracker.connect(&a).await; // 1 attempt
    tracker.connect(&b).await; // 2 attempts
    let report = tracker.broadcast_stats().await;

    assert_eq!(report.attempts(), 2);
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn failed_send_removes_connection() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (c1, rx1) = channel_conn("10.0.0.1");
    let (c2, mut rx2) = channel_conn("10.0.0.2");
    tracker.connect(&c1).await;
    tracker.connect(&c2).await;
    drain(&mut rx2);

    drop(rx1);
    let report = tracker.broadcast_stats().await;

    assert_eq!(tracker.get_active_connections().await, 1);
    assert_eq!(
        report.outcome(c1.id()),
        Some(&Delivery::Failed(SinkError::Closed))
    );
    assert_eq!(report.failed().collect::<Vec<_>>(), vec![c1.id()]);
    assert_eq!(drain(&mut rx2).len(), 1);

    // c1 is gone for good: later broadcasts skip it and its disconnect is a no-op.
    let report = tracker.broadcast_stats().await;
    assert_eq!(report.attempts(), 1);
    assert!(tracker.disconnect(&c1).await.is_none());
}

#[tokio::test]
async fn stalled_connection_is_removed_when_buffer_fills() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (stalled, _rx) = Connection::channel(ClientKey::new("10.0.0.9"), 1);
    tracker.connect(&stalled).await;

    let report = tracker.broadcast_stats().await;
    assert_eq!(
        report.outcome(stalled.id()),
        Some(&Delivery::Failed(SinkError::Full))
    );
    assert_eq!(tracker.get_active_connections().await, 0);
}

#[tokio::test]
async fn burst_evicts_lagging_connection_and_signals_owner() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (lagging, mut rx) = Connection::channel(ClientKey::new("10.0.0.5"), 4);
    let owner_copy = lagging.clone();
    tracker.connect(&lagging).await;

    for _ in 0..5 {
        tracker.record_page_view("home").await;
    }
    assert_eq!(tracker.get_active_connections().await, 0);

    // The owner keeps its clone (and so the sender) alive; the eviction
    // signal is what tells it to close the socket.
    assert_eq!(drain(&mut rx).len(), 4);
    assert!(owner_copy.is_evicted());
    tokio::time::timeout(Duration::from_secs(1), owner_copy.evicted())
        .await
        .expect("owner never told about eviction");
}

#[tokio::test]
async fn disconnect_does_not_mark_eviction() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (conn, _rx) = channel_conn("10.0.0.1");
    tracker.connect(&conn).await;
    tracker.disconnect(&conn).await;
    assert!(!conn.is_evicted());
}

#[tokio::test]
async fn displaced_address_connection_is_evicted() {
    let tracker = VisitTracker::new(CountingPolicy::UniqueAddress, "home");
    let (older, _ra) = channel_conn("10.0.0.1");
    let (newer, _rb) = channel_conn("10.0.0.1");
    tracker.connect(&older).await;
    tracker.connect(&newer).await;

    assert!(older.is_evicted());
    assert!(!newer.is_evicted());
}

#[tokio::test]
async fn page_views_count_per_page() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    for _ in 0..3 {
        tracker.increment_page_view("home").await;
    }
    assert_eq!(tracker.get_page_views("home").await, 3);
    assert_eq!(tracker.get_page_views("missing").await, 0);
    assert_eq!(tracker.tracked_pages().await, 1);
}

#[tokio::test]
async fn increment_page_view_does_not_broadcast() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (conn, mut rx) = channel_conn("10.0.0.1");
    tracker.connect(&conn).await;
    drain(&mut rx);

    tracker.increment_page_view("home").await;
    assert!(drain(&mut rx).is_empty());

    let report = tracker.record_page_view("home").await;
    assert_eq!(report.snapshot.map(|s| s.page_views), Some(2));
    let received = drain(&mut rx);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].page_views, 2);
}

#[tokio::test]
async fn snapshot_reports_only_the_stats_page() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    tracker.increment_page_view("item").await;
    tracker.increment_page_view("item").await;
    tracker.increment_page_view("home").await;
    assert_eq!(tracker.snapshot().await.page_views, 1);
}

#[tokio::test]
async fn total_visit_counter() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    assert_eq!(tracker.get_total_visits().await, 0);
    assert_eq!(tracker.increment_total_visits().await, 1);
    assert_eq!(tracker.increment_total_visits().await, 2);
    assert_eq!(tracker.get_total_visits().await, 2);
}

#[tokio::test]
async fn per_connect_scenario() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (a, _ra) = channel_conn("10.0.0.1");
    let (b, _rb) = channel_conn("10.0.0.1");

    tracker.connect(&a).await;
    assert_eq!(tracker.get_total_visits().await, 1);
    assert_eq!(tracker.get_active_connections().await, 1);

    // Same address still counts under this policy.
    tracker.connect(&b).await;
    assert_eq!(tracker.get_total_visits().await, 2);
    assert_eq!(tracker.get_active_connections().await, 2);

    assert!(tracker.disconnect(&a).await.is_some());
    assert_eq!(tracker.get_active_connections().await, 1);

    assert!(tracker.disconnect(&a).await.is_none());
    assert_eq!(tracker.get_active_connections().await, 1);
}

#[tokio::test]
async fn unique_address_scenario_with_distinct_clients() {
    let tracker = VisitTracker::new(CountingPolicy::UniqueAddress, "home");
    let (a, _ra) = channel_conn("10.0.0.1");
    let (b, _rb) = channel_conn("10.0.0.2");

    tracker.connect(&a).await;
    tracker.connect(&b).await;
    assert_eq!(tracker.get_total_visits().await, 2);
    assert_eq!(tracker.get_active_connections().await, 2);

    tracker.disconnect(&a).await;
    tracker.disconnect(&a).await;
    assert_eq!(tracker.get_active_connections().await, 1);
}

#[tokio::test]
async fn unique_address_counts_shared_address_once() {
    let tracker = VisitTracker::new(CountingPolicy::UniqueAddress, "home");
    let (a, _ra) = channel_conn("10.0.0.1");
    let (b, mut rb) = channel_conn("10.0.0.1");

    tracker.connect(&a).await;
    tracker.connect(&b).await;
    assert_eq!(tracker.get_total_visits().await, 1);
    assert_eq!(tracker.get_active_connections().await, 1);

    // The displaced connection closing late must not evict its replacement.
    drain(&mut rb);
    assert!(tracker.disconnect(&a).await.is_none());
    assert_eq!(tracker.get_active_connections().await, 1);
    assert!(drain(&mut rb).is_empty());

    assert!(tracker.disconnect(&b).await.is_some());
    assert_eq!(tracker.get_active_connections().await, 0);

    // Returning after leaving is a new visit.
    let (c, _rc) = channel_conn("10.0.0.1");
    tracker.connect(&c).await;
    assert_eq!(tracker.get_total_visits().await, 2);
}

#[tokio::test]
async fn disconnect_notifies_remaining_connections() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (a, mut ra) = channel_conn("10.0.0.1");
    let (b, mut rb) = channel_conn("10.0.0.2");
    tracker.connect(&a).await;
    tracker.connect(&b).await;
    drain(&mut ra);
    drain(&mut rb);

    let report = tracker.disconnect(&a).await.unwrap();
    assert_eq!(report.attempts(), 1);
    assert!(drain(&mut ra).is_empty());
    let received = drain(&mut rb);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].active_users, 1);
}

#[tokio::test]
async fn last_disconnect_sends_nothing() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let (a, _ra) = channel_conn("10.0.0.1");
    tracker.connect(&a).await;

    let report = tracker.disconnect(&a).await.unwrap();
    assert_eq!(report.attempts(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_proceeds_during_inflight_broadcast() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let gate = Arc::new(GateSink::default());
    let a = Connection::new(ClientKey::new("10.0.0.1"), gate.clone());
    let (b, _rb) = channel_conn("10.0.0.2");
    tracker.connect(&a).await;
    tracker.connect(&b).await;

    gate.armed.store(true, Ordering::SeqCst);
    let broadcaster = tracker.clone();
    let inflight = tokio::spawn(async move { broadcaster.broadcast_stats().await });
    gate.entered.notified().await;

    let report = tokio::time::timeout(Duration::from_secs(2), tracker.disconnect(&a))
        .await
        .expect("disconnect blocked by in-flight broadcast");
    assert!(report.is_some());

    gate.release.notify_one();
    let report = inflight.await.unwrap();
    assert!(matches!(
        report.outcome(a.id()),
        Some(Delivery::Failed(SinkError::Transport(_)))
    ));
    assert_eq!(tracker.get_active_connections().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connects_and_disconnects_balance() {
    let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
    let mut handles = Vec::new();
    for i in 0..50 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            let (conn, _rx) = Connection::channel(ClientKey::new(format!("10.0.1.{i}")), 128);
            tracker.connect(&conn).await;
            tracker.increment_page_view("home").await;
            tracker.disconnect(&conn).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(tracker.get_active_connections().await, 0);
    assert_eq!(tracker.get_total_visits().await, 50);
    assert_eq!(tracker.get_page_views("home").await, 50);
}
