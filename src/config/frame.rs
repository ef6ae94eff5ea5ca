//! `[frame]` section configuration.
//!
//! Frames run with the minimal capability grant unless overridden.
//!
//! # Example
//!
//! ```toml
//! [frame]
//! sandbox = "allow-scripts allow-forms allow-popups allow-modals"
//! load_timeout_ms = 10000      # Wait for DOMContentLoaded / load
//! call_timeout_ms = 30000      # Wait for an RPC reply
//! ready_poll_ms = 50           # Readiness poll interval inside the frame
//! ready_poll_limit = 200       # Poll attempts before giving up
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigDiagnostics;

pub const DEFAULT_SANDBOX: &str = "allow-scripts allow-forms allow-popups allow-modals";

/// Permission-policy features switched off for every frame.
const DISABLED_FEATURES: &[&str] = &[
    "accelerometer",
    "autoplay",
    "camera",
    "document-domain",
    "encrypted-media",
    "fullscreen",
    "geolocation",
    "gyroscope",
    "magnetometer",
    "microphone",
    "midi",
    "payment",
    "picture-in-picture",
    "sync-xhr",
    "usb",
    "xr-spatial-tracking",
];

/// The `allow` attribute that disables every listed feature.
pub fn default_allow() -> String {
    DISABLED_FEATURES
        .iter()
        .map(|feature| format!("{feature} 'none'"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub sandbox: String,
    pub allow: String,
    pub load_timeout_ms: u64,
    pub call_timeout_ms: u64,
    pub ready_poll_ms: u64,
    pub ready_poll_limit: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            sandbox: DEFAULT_SANDBOX.to_string(),
            allow: default_allow(),
            load_timeout_ms: 10_000,
            call_timeout_ms: 30_000,
            ready_poll_ms: 50,
            ready_poll_limit: 200,
        }
    }
}

impl FrameConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let tokens: Vec<&str> = self.sandbox.split_whitespace().collect();
        if tokens.contains(&"allow-scripts") && tokens.contains(&"allow-same-origin") {
            diag.error_with_hint(
                "frame.sandbox",
                "`allow-scripts` together with `allow-same-origin` lets the frame escape its sandbox",
                "remove `allow-same-origin`",
            );
        }
        for token in tokens.iter().filter(|t| !t.starts_with("allow-")) {
            diag.error("frame.sandbox", format!("unknown sandbox token `{token}`"));
        }

        if self.load_timeout_ms == 0 {
            diag.error("frame.load_timeout_ms", "must be greater than zero");
        }
        if self.call_timeout_ms == 0 {
            diag.error("frame.call_timeout_ms", "must be greater than zero");
        }
        if self.ready_poll_ms == 0 {
            diag.error("frame.ready_poll_ms", "must be greater than zero");
        }
        if self.ready_poll_limit == 0 {
            diag.error("frame.ready_poll_limit", "must be greater than zero");
        }
    }
}
