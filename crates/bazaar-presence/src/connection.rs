use std::fmt;
use std::sync::Arc;

use bazaar_common::{ClientKey, ConnectionId};
use tokio::sync::{mpsc, watch};

use crate::sink::{SinkError, StatsSink};

/// One open channel to a live client.
///
/// Cloning is cheap and every clone refers to the same connection: the
/// tracker matches connections by [`ConnectionId`], never by sink.
///
/// When the tracker drops a connection on its own (failed send, or a newer
/// connection took over its address) it marks it evicted. Whoever owns the
/// client socket should wait on [`Connection::evicted`] and close it.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    key: ClientKey,
    sink: Arc<dyn StatsSink>,
    evicted: Arc<watch::Sender<bool>>,
}

impl Connection {
    pub fn new(key: ClientKey, sink: Arc<dyn StatsSink>) -> Self {
        let (evicted, _) = watch::channel(false);
        Self {
            id: ConnectionId::new(),
            key,
            sink,
            evicted: Arc::new(evicted),
        }
    }

    /// Connection backed by a bounded channel. The receiver is drained by
    /// whatever writes to the client.
    pub fn channel(key: ClientKey, buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel::<String>(buffer.max(1));
        (Self::new(key, Arc::new(tx)), rx)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    pub fn is_evicted(&self) -> bool {
        *self.evicted.borrow()
    }

    /// Resolves once the tracker has dropped this connection. Never resolves
    /// for a connection removed through `disconnect`.
    pub async fn evicted(&self) {
        let mut rx = self.evicted.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|gone| *gone).await;
    }

    pub(crate) fn evict(&self) {
        self.evicted.send_replace(true);
    }

    pub(crate) async fn send(&self, payload: &str) -> Result<(), SinkError> {
        self.sink.send_stats(payload).await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("evicted", &self.is_evicted())
            .finish_non_exhaustive()
    }
}
