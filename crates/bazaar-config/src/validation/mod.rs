//! Configuration validation.
//!
//! Each check pushes a message naming the offending field; the orchestrator
//! joins them into a single `ConfigError`.

mod helpers;


use crate::schema::{BazaarConfig, MAX_PAGE_NAME_LEN};
use bazaar_common::ConfigError;
use helpers::validate_range;

/// Upper bound on distinct page counters a config may allow.
const MAX_PAGES: u32 = 256;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BazaarConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_presence(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &BazaarConfig) {
    if config.server.port == 0 {
        errors.push("server.port must not be 0".into());
    }
    if !config.server.ws_path.starts_with('/') {
        errors.push(format!(
            "server.ws_path = {:?} must start with '/'",
            config.server.ws_path
        ));
    }
    validate_range(
        errors,
        "server.outbound_buffer",
        config.server.outbound_buffer,
        1,
        1024,
    );
}

fn validate_presence(errors: &mut Vec<String>, config: &BazaarConfig) {
    let presence = &config.presence;
    if presence.stats_page.trim().is_empty() {
        errors.push("presence.stats_page must not be empty".into());
    } else if !presence.allows_page(&presence.stats_page) {
        errors.push(format!(
            "presence.stats_page = {:?} is not listed in presence.pages",
            presence.stats_page
        ));
    }
    validate_range(
        errors,
        "presence.pages length",
        presence.pages.len() as u32,
        1,
        MAX_PAGES,
    );
    for page in &presence.pages {
        if page.trim().is_empty() || page.len() > MAX_PAGE_NAME_LEN {
            errors.push(format!(
                "presence.pages entry {page:?} must be 1-{MAX_PAGE_NAME_LEN} bytes"
            ));
        }
    }
}
