//! Envelope wire shape and identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProtocolError;

// =============================================================================
// Identifiers
// =============================================================================

/// Routing identity of a frame.
///
/// A preview keeps one logical frame id for its whole life; during a swap
/// the staging frame answers to `TEMP_<id>` until it is rebound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a stable frame id from a preview title.
    ///
    /// Uses the first 8 bytes of the blake3 digest, hex encoded.
    pub fn for_title(title: &str) -> Self {
        let hash = blake3::hash(title.as_bytes());
        Self(format!("frame-{}", hex::encode(&hash.as_bytes()[..8])))
    }

    /// Identity of the staging frame used while swapping this one.
    pub fn staging(&self) -> Self {
        Self(format!("TEMP_{}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Correlation id of one RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

static NEXT_RUN: AtomicU64 = AtomicU64::new(1);

impl RunId {
    /// Generate a run id unique within this process.
    pub fn generate() -> Self {
        Self(format!("run-{}", NEXT_RUN.fetch_add(1, Ordering::Relaxed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// A single cross-boundary message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub frame_id: FrameId,
    pub name: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

impl Envelope {
    pub fn new(frame_id: FrameId, name: impl Into<String>, data: Value) -> Self {
        Self {
            frame_id,
            name: name.into(),
            data,
            run_id: None,
        }
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Whether this envelope is routed to (or from) the given frame.
    pub fn is_for(&self, frame_id: &FrameId) -> bool {
        &self.frame_id == frame_id
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"frameId":"{}","name":"{}"}}"#, self.frame_id, self.name)
        })
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let env = Envelope::new(FrameId::new("frame-a"), "resize", json!({"height": 10}));
        let json = env.to_json();
        assert!(json.contains(r#""frameId":"frame-a""#));
        assert!(json.contains(r#""name":"resize""#));
        assert!(!json.contains("runId"));

        let env = env.with_run_id(RunId::from("run-1"));
        assert!(env.to_json().contains(r#""runId":"run-1""#));
    }

    #[test]
    fn test_envelope_missing_data_defaults_to_null() {
        let env = Envelope::from_json(r#"{"frameId":"f","name":"load"}"#).unwrap();
        assert_eq!(env.data, Value::Null);
        assert!(env.run_id.is_none());
    }

    #[test]
    fn test_envelope_rejects_garbage() {
        assert!(Envelope::from_json("not json").is_err());
        assert!(Envelope::from_json(r#"{"name":"load"}"#).is_err());
    }

    #[test]
    fn test_frame_id_for_title_is_stable() {
        let a = FrameId::for_title("my preview");
        let b = FrameId::for_title("my preview");
        let c = FrameId::for_title("other preview");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_str().starts_with("frame-"));
        assert_eq!(a.as_str().len(), "frame-".len() + 16);
        assert_eq!(a.staging().as_str(), format!("TEMP_{a}"));
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert_ne!(a, b);
    }
}
