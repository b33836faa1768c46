//! Accept loop: upgrade each TCP stream and hand it to a connection handler.

use std::collections::HashSet;
use std::sync::Arc;

use bazaar_config::BazaarConfig;
use bazaar_presence::VisitTracker;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;

use crate::connection::handle_connection;
use crate::handshake::PathFilter;

/// Per-listener settings shared by every connection.
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub ws_path: Arc<str>,
    pub outbound_buffer: usize,
    /// Pages clients may report views for.
    pub pages: Arc<HashSet<String>>,
}

impl ListenerSettings {
    pub fn from_config(config: &BazaarConfig) -> Self {
        Self {
            ws_path: Arc::from(config.server.ws_path.as_str()),
            outbound_buffer: config.server.outbound_buffer as usize,
            pages: Arc::new(config.presence.pages.iter().cloned().collect()),
        }
    }

    pub fn allows_page(&self, page: &str) -> bool {
        self.pages.contains(page)
    }
}

/// Run the accept loop forever. Accept and handshake errors are logged and
/// never stop the loop.
pub async fn serve(listener: TcpListener, tracker: VisitTracker, settings: ListenerSettings) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let tracker = tracker.clone();
                let settings = settings.clone();
                tokio::spawn(async move {
                    let filter = PathFilter::new(Arc::clone(&settings.ws_path));
                    match accept_hdr_async(stream, filter).await {
                        Ok(ws) => handle_connection(ws, addr, tracker, &settings).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
