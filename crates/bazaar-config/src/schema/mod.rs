//! Configuration schema. One struct per TOML table.

mod logging;
mod presence;
mod server;

pub use logging::LoggingConfig;
pub use presence::{PresenceConfig, MAX_PAGE_NAME_LEN};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BazaarConfig {
    pub server: ServerConfig,
    pub presence: PresenceConfig,
    pub logging: LoggingConfig,
}
