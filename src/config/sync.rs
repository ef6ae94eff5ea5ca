//! `[sync]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sync]
//! debounce_ms = 250            # Quiet time before a same-id edit is sent
//! strategy = "full-replace"    # or "diff-patch"
//! max_patch_failures = 3       # Failed patches before falling back (0 = never)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;
use crate::diff::StrategyKind;

/// Longest accepted debounce window.
const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub debounce_ms: u64,

    /// How same-id edits in instant mode reach the frame.
    pub strategy: StrategyKind,

    pub max_patch_failures: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            strategy: StrategyKind::default(),
            max_patch_failures: 3,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            diag.error_with_hint(
                "sync.debounce_ms",
                format!("{}ms is longer than {}ms", self.debounce_ms, MAX_DEBOUNCE_MS),
                "edits would appear to hang; use a few hundred milliseconds",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigError, test_parse_config};
    use crate::diff::StrategyKind;

    #[test]
    fn test_sync_config() {
        let config = test_parse_config(
            "[sync]\ndebounce_ms = 100\nstrategy = \"diff-patch\"\nmax_patch_failures = 0",
        );
        assert_eq!(config.sync.debounce_ms, 100);
        assert_eq!(config.sync.strategy, StrategyKind::DiffPatch);
        assert_eq!(config.sync.max_patch_failures, 0);
    }

    #[test]
    fn test_sync_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.sync.debounce().as_millis(), 250);
        assert_eq!(config.sync.strategy, StrategyKind::FullReplace);
        assert_eq!(config.sync.max_patch_failures, 3);
    }

    #[test]
    fn test_long_debounce_rejected() {
        let config = test_parse_config("[sync]\ndebounce_ms = 60000");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Diagnostics(ref d) if d.errors()[0].field == "sync.debounce_ms"));
    }
}
