use bazaar_common::CountingPolicy;
use serde::{Deserialize, Serialize};

/// Longest page name accepted in `presence.pages`.
pub const MAX_PAGE_NAME_LEN: usize = 64;

/// Live visitor tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub counting: CountingPolicy,
    /// Page whose view counter is included in every stats broadcast.
    pub stats_page: String,
    /// Pages a client may report views for. Anything else is ignored.
    pub pages: Vec<String>,
}

impl PresenceConfig {
    pub fn allows_page(&self, page: &str) -> bool {
        self.pages.iter().any(|p| p == page)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            counting: CountingPolicy::default(),
            stats_page: "home".into(),
            pages: vec!["home".into(), "item".into(), "categories".into()],
        }
    }
}
