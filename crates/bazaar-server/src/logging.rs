//! Subscriber setup. Logging starts on the built-in filter so config loading
//! is visible, then moves to `logging.filter` unless `RUST_LOG` pinned it.

use bazaar_config::LoggingConfig;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

pub struct LogHandle {
    reload: Option<reload::Handle<EnvFilter, Registry>>,
}

pub fn init() -> LogHandle {
    let from_env = EnvFilter::try_from_default_env().ok();
    let pinned = from_env.is_some();
    let filter = from_env.unwrap_or_else(|| EnvFilter::new(LoggingConfig::default().filter));

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    LogHandle {
        reload: (!pinned).then_some(handle),
    }
}

impl LogHandle {
    /// Switch to the configured filter. A bad filter keeps the current one.
    pub fn apply(&self, config: &LoggingConfig) {
        let Some(handle) = &self.reload else {
            tracing::debug!("RUST_LOG is set, ignoring logging.filter");
            return;
        };
        match EnvFilter::try_new(&config.filter) {
            Ok(filter) => {
                if let Err(e) = handle.reload(filter) {
                    tracing::warn!(error = %e, "Failed to apply logging.filter");
                }
            }
            Err(e) => {
                tracing::warn!(filter = %config.filter, error = %e, "Invalid logging.filter, keeping default");
            }
        }
    }
}
