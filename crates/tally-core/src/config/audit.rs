//! Audit pipeline configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the audit pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit recording is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Time budget, in seconds, for one persistence attempt (tenant-scope
    /// acquisition plus the insert).
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_store_timeout_secs() -> u64 {
    5
}
