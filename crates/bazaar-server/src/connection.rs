//! Per-connection handler: register, stream stats out, read page views in.

use std::net::SocketAddr;

use bazaar_common::ClientKey;
use bazaar_presence::{Connection, VisitTracker};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::listener::ListenerSettings;
use crate::protocol::ClientMessage;

/// Handle a single WebSocket connection until the client goes away or the
/// tracker evicts it.
pub async fn handle_connection(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    addr: SocketAddr,
    tracker: VisitTracker,
    settings: &ListenerSettings,
) {
    let (mut sink, mut stream) = ws.split();

    // 1. Register. The tracker queues the first snapshot into `rx` right away.
    let (conn, mut rx) =
        Connection::channel(ClientKey::from_peer(Some(addr)), settings.outbound_buffer);
    tracker.connect(&conn).await;

    // 2. Forward queued snapshots out and client messages in.
    let mut evicted = false;
    loop {
        tokio::select! {
            Some(payload) = rx.recv() => {
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }

            _ = conn.evicted() => {
                evicted = true;
                break;
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                        Ok(ClientMessage::PageView { page }) if settings.allows_page(&page) => {
                            tracker.record_page_view(&page).await;
                        }
                        Ok(ClientMessage::PageView { page }) => {
                            tracing::debug!(peer = %addr, page = %page, "Ignoring view of unlisted page");
                        }
                        Err(e) => {
                            tracing::debug!(peer = %addr, error = %e, "Ignoring client message");
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 3. Cleanup. Evicted connections are already out of the tracker and
    //    get told why the socket is closing.
    if evicted {
        tracing::info!(peer = %addr, conn = conn.id().short(), "Closing evicted connection");
        let frame = CloseFrame {
            code: CloseCode::Again,
            reason: "stats stream dropped, reconnect".into(),
        };
        let _ = sink.send(Message::Close(Some(frame))).await;
    } else {
        tracker.disconnect(&conn).await;
    }
    let _ = sink.close().await;
    tracing::debug!(peer = %addr, conn = conn.id().short(), "Connection closed");
}
