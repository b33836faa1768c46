//! Reading `config.toml` into a [`BazaarConfig`].

use std::io::ErrorKind;
use std::path::Path;

use bazaar_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::BazaarConfig;
use crate::validation;

/// Read and parse the tracker config at `path`.
///
/// Absent tables and keys fall back to their defaults. Validation problems
/// are only logged here; `load_config` is the strict entry point.
pub fn load_from_path(path: &Path) -> Result<BazaarConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    let config = parse(path, &text)?;
    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "tracker config has problems: {e}");
    }

    info!(path = %path.display(), policy = %config.presence.counting, "tracker config loaded");
    Ok(config)
}

/// Config at the per-user location, e.g. `~/.config/bazaar/config.toml`.
///
/// A first run writes the commented template there and starts on defaults.
pub fn load_default() -> Result<BazaarConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "first run, writing config template");
            create_default_config(&path)?;
            Ok(BazaarConfig::default())
        }
        other => other,
    }
}

fn parse(path: &Path, text: &str) -> Result<BazaarConfig, ConfigError> {
    toml::from_str(text)
        .map_err(|e| ConfigError::ParseError(format!("{} is not valid TOML: {e}", path.display())))
}
