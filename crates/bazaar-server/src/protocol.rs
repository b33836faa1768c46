//! Messages a page may send over its live stats socket. Outbound payloads
//! are `bazaar_presence::StatsSnapshot`.

use serde::Deserialize;

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// The page holding this socket was rendered.
    #[serde(rename = "page_view")]
    PageView { page: String },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid client message: {e}"))
    }
}
