//! Bazaar server configuration.
//!
//! TOML-based configuration for the live visitor tracker and its WebSocket
//! endpoint. Every section has defaults, so a partial file (or none at all)
//! yields a runnable server.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bazaar_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BazaarConfig, LoggingConfig, PresenceConfig, ServerConfig, MAX_PAGE_NAME_LEN};

use bazaar_common::ConfigError;

/// Load config from the platform default path and validate it.
///
/// Creates a documented default file when none exists. Unlike
/// [`toml_loader::load_from_path`], validation failures are returned as errors.
pub fn load_config() -> Result<BazaarConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BazaarConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
