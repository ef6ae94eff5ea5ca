//! Source documents and render modes.

use serde::{Deserialize, Serialize};

use crate::dom::parse_document;

/// One version of the document to preview.
///
/// `id` is the document's identity: a changed id is navigation, the same id
/// with different html is an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub html: String,
}

impl Source {
    pub fn new(id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            html: html.into(),
        }
    }
}

/// Configured update mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `Refresh` when the document has a `<script>`, `Instant` otherwise
    #[default]
    Auto,
    Instant,
    Refresh,
}

/// How a particular document is kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Patch the live document in place
    Instant,
    /// Reload through a staging frame and swap
    Refresh,
}

impl Mode {
    pub fn resolve(self, html: &str) -> RenderMode {
        match self {
            Self::Instant => RenderMode::Instant,
            Self::Refresh => RenderMode::Refresh,
            Self::Auto if parse_document(html).contains_tag("script") => RenderMode::Refresh,
            Self::Auto => RenderMode::Instant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_follows_scripts() {
        assert_eq!(Mode::Auto.resolve("<p>x</p>"), RenderMode::Instant);
        assert_eq!(
            Mode::Auto.resolve("<p>x</p><script>go()</script>"),
            RenderMode::Refresh
        );
    }

    #[test]
    fn test_explicit_modes_ignore_content() {
        assert_eq!(Mode::Instant.resolve("<script></script>"), RenderMode::Instant);
        assert_eq!(Mode::Refresh.resolve("<p>x</p>"), RenderMode::Refresh);
    }

    #[test]
    fn test_mode_names() {
        let mode: Mode = serde_json::from_str("\"refresh\"").unwrap();
        assert_eq!(mode, Mode::Refresh);
    }
}
