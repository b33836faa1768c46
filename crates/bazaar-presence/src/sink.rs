//! Outbound side of a live connection.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Why a payload could not be handed to a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("connection closed")]
    Closed,

    #[error("outbound buffer full")]
    Full,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Anything that can carry a serialized stats payload to one client.
#[async_trait]
pub trait StatsSink: Send + Sync {
    async fn send_stats(&self, payload: &str) -> Result<(), SinkError>;
}

/// The server hands each socket writer the receiving half of this channel.
/// A full buffer means the writer has stalled, so it counts as a failure.
#[async_trait]
impl StatsSink for mpsc::Sender<String> {
    async fn send_stats(&self, payload: &str) -> Result<(), SinkError> {
        self.try_send(payload.to_owned()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}
