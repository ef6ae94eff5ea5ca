//! Preview configuration, `boxcutter.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error    # ConfigError, ConfigDiagnostics
//! ├── frame    # [frame]
//! ├── sync     # [sync]
//! └── mod.rs   # PreviewConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | top level | `title` (frame title and id seed), `mode`        |
//! | `[sync]`  | Debounce window, patch strategy, failure limit   |
//! | `[frame]` | Sandbox, permissions, load/call timeouts, polling |
//!
//! Every section is optional; missing fields take their defaults.

mod error;
pub mod frame;
pub mod sync;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use frame::FrameConfig;
pub use sync::SyncConfig;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::source::Mode;

pub const DEFAULT_CONFIG_NAME: &str = "boxcutter.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Frame title; also seeds the frame id.
    pub title: String,
    pub mode: Mode,
    pub sync: SyncConfig,
    pub frame: FrameConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            title: "preview".to_string(),
            mode: Mode::default(),
            sync: SyncConfig::default(),
            frame: FrameConfig::default(),
        }
    }
}

impl PreviewConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file, warning about unknown fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            crate::log!("warning"; "unknown fields in {}, ignoring:", path.display());
            for field in &ignored {
                eprintln!("- {}", field);
            }
        }
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            crate::debug!("config"; "{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Collect every validation error and return them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.title.trim().is_empty() {
            diag.error("title", "must not be empty");
        }
        self.sync.validate(&mut diag);
        self.frame.validate(&mut diag);

        diag.into_result()
    }
}

/// Parse a config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PreviewConfig {
    let (parsed, ignored) = PreviewConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_invalid_toml() {
        let result = PreviewConfig::parse("title = ");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_preview_config_default() {
        let config = PreviewConfig::default();
        assert_eq!(config.title, "preview");
        assert_eq!(config.mode, Mode::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_top_level_fields() {
        let config = test_parse_config("title = \"Docs\"\nmode = \"refresh\"");
        assert_eq!(config.title, "Docs");
        assert_eq!(config.mode, Mode::Refresh);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let (_, ignored) =
            PreviewConfig::parse_with_ignored("titel = \"x\"\n[sync]\nbounce = 1").unwrap();
        assert_eq!(ignored, ["titel", "sync.bounce"]);
    }

    #[test]
    fn test_empty_title_rejected() {
        let config = test_parse_config("title = \"  \"");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title = \"From File\"\n[frame]\ncall_timeout_ms = 5").unwrap();

        let config = PreviewConfig::load(file.path()).unwrap();
        assert_eq!(config.title, "From File");
        assert_eq!(config.frame.call_timeout_ms, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_NAME);

        assert!(matches!(PreviewConfig::load(&path), Err(ConfigError::Io(..))));
        assert_eq!(
            PreviewConfig::load_or_default(&path).unwrap(),
            PreviewConfig::default()
        );
    }
}
