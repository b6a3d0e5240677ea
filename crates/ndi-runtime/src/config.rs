use serde::{Deserialize, Serialize};

/// Finder settings owned by the host and persisted by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// List sources running on this machine too.
    pub show_local_sources: bool,

    /// Extra addresses to probe, passed to the runtime verbatim (its own
    /// separator rules apply). Empty means none.
    pub extra_ips: String,

    /// Group filter; `None` means every group.
    pub groups: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            show_local_sources: true,
            extra_ips: String::new(),
            groups: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_extra_ips(mut self, extra_ips: impl Into<String>) -> Self {
        self.extra_ips = extra_ips.into();
        self
    }

    pub fn with_groups(mut self, groups: Option<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_local_sources(mut self, show: bool) -> Self {
        self.show_local_sources = show;
        self
    }
}
