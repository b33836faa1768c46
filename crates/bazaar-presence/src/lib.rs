//! Live visitor tracking for the bazaar storefront.
//!
//! A [`VisitTracker`] keeps the set of connected live clients, a total visit
//! counter and per-page view counters. Whenever presence changes it pushes a
//! [`StatsSnapshot`] to every live connection. Delivery is best effort: a
//! connection whose send fails is dropped from the registry, and the outcome
//! for every connection is reported back in a [`DeliveryReport`].
//!
//! The tracker is an explicitly constructed handle. Clone it into every
//! connection handler; all clones share one registry.
//!
//! # Example
//!
//! ```rust,no_run
//! use bazaar_common::{ClientKey, CountingPolicy};
//! use bazaar_presence::{Connection, VisitTracker};
//!
//! # async fn run() {
//! let tracker = VisitTracker::new(CountingPolicy::PerConnect, "home");
//! let (conn, mut rx) = Connection::channel(ClientKey::new("10.0.0.1"), 32);
//!
//! tracker.connect(&conn).await;
//! let payload = rx.recv().await; // {"active_users":1,"total_visits":1,"page_views":0}
//!
//! tracker.record_page_view("home").await;
//! tracker.disconnect(&conn).await;
//! # }
//! ```

pub mod connection;
pub mod report;
pub mod sink;
pub mod snapshot;
pub mod tracker;

pub use connection::Connection;
pub use report::{Delivery, DeliveryReport};
pub use sink::{SinkError, StatsSink};
pub use snapshot::StatsSnapshot;
pub use tracker::VisitTracker;
