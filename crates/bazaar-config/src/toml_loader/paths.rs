//! Where the tracker keeps its config file.

use std::path::{Path, PathBuf};

use bazaar_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "bazaar";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/bazaar/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no per-user config directory on this platform".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_failure("create", dir, e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| io_failure("write", path, e))?;

    info!(path = %path.display(), "config template written");
    Ok(())
}

fn io_failure(action: &str, path: &Path, err: std::io::Error) -> ConfigError {
    ConfigError::ParseError(format!("cannot {action} {}: {err}", path.display()))
}
