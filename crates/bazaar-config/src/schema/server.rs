use serde::{Deserialize, Serialize};

/// Listener settings for the WebSocket endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: String,
    pub port: u16,
    /// Request path the live stats socket is served on.
    pub ws_path: String,
    /// Queued payloads per connection before it is considered stuck.
    pub outbound_buffer: u32,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            ws_path: "/ws".into(),
            outbound_buffer: 32,
        }
    }
}
