//! Typed host commands and frame events.
//!
//! The wire carries plain envelopes; both sides immediately lift them into
//! these enums so that dispatch is a `match` instead of string comparisons.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::envelope::{Envelope, FrameId, RunId};
use super::names;
use super::remote_error::RemoteError;
use super::ProtocolError;
use crate::diff::PatchOp;

// =============================================================================
// Payloads
// =============================================================================

/// Scroll offset of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPosition {
    #[serde(default)]
    pub scroll_top: f64,
    #[serde(default)]
    pub scroll_left: f64,
}

impl ScrollPosition {
    pub const ORIGIN: Self = Self {
        scroll_top: 0.0,
        scroll_left: 0.0,
    };

    pub fn new(scroll_top: f64, scroll_left: f64) -> Self {
        Self {
            scroll_top,
            scroll_left,
        }
    }
}

/// Viewport and content dimensions reported on resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSize {
    pub height: f64,
    pub width: f64,
    pub scroll_height: f64,
    pub scroll_width: f64,
    pub is_resizing: bool,
}

impl DocumentSize {
    /// Same dimensions, ignoring the resizing flag.
    pub fn same_dimensions(&self, other: &Self) -> bool {
        self.height == other.height
            && self.width == other.width
            && self.scroll_height == other.scroll_height
            && self.scroll_width == other.scroll_width
    }
}

/// Pointer telemetry. Every field is cleared on `mouseleave`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerData {
    pub target: Option<String>,
    pub event: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl PointerData {
    /// Pointer over content, sent with `mouseenter` and `mousemove`.
    pub fn hover(target: Option<String>, x: f64, y: f64) -> Self {
        Self::with_event("hover", target, x, y)
    }

    pub fn click(target: Option<String>, x: f64, y: f64) -> Self {
        Self::with_event(names::CLICK, target, x, y)
    }

    fn with_event(event: &str, target: Option<String>, x: f64, y: f64) -> Self {
        Self {
            target,
            event: Some(event.to_string()),
            x: Some(x),
            y: Some(y),
        }
    }

    /// The all-empty record sent with `mouseleave`.
    pub fn left() -> Self {
        Self::default()
    }
}

// =============================================================================
// Host -> Frame
// =============================================================================

/// Messages the host sends to a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Replace the whole document and re-run its scripts.
    Write(String),
    /// Apply a structural patch to the live document.
    Update(Vec<PatchOp>),
    /// Replace the document tree, keeping the script context alive.
    HtmlUpdate(String),
    Scroll(ScrollPosition),
    SetFrameId(FrameId),
    /// Invoke `fn:<function>` in the frame.
    Call {
        function: String,
        data: Value,
        run_id: RunId,
    },
    /// A user event dispatched to frame listeners.
    Event { name: String, data: Value },
}

impl HostCommand {
    pub fn name(&self) -> String {
        match self {
            Self::Write(_) => names::WRITE.to_string(),
            Self::Update(_) => names::UPDATE.to_string(),
            Self::HtmlUpdate(_) => names::HTML_UPDATE.to_string(),
            Self::Scroll(_) => names::SCROLL.to_string(),
            Self::SetFrameId(_) => names::SET_FRAME_ID.to_string(),
            Self::Call { function, .. } => format!("{}{function}", names::FN_PREFIX),
            Self::Event { name, .. } => name.clone(),
        }
    }

    /// Whether this command mutates an already loaded document in place.
    pub fn is_patch(&self) -> bool {
        matches!(self, Self::Update(_) | Self::HtmlUpdate(_))
    }

    pub fn into_envelope(self, frame_id: &FrameId) -> Envelope {
        let name = self.name();
        let frame_id = frame_id.clone();
        match self {
            Self::Write(html) | Self::HtmlUpdate(html) => {
                Envelope::new(frame_id, name, Value::String(html))
            }
            Self::Update(ops) => Envelope::new(frame_id, name, to_value(&ops)),
            Self::Scroll(pos) => Envelope::new(frame_id, name, to_value(&pos)),
            Self::SetFrameId(id) => Envelope::new(frame_id, name, json!(id)),
            Self::Call { data, run_id, .. } => {
                Envelope::new(frame_id, name, data).with_run_id(run_id)
            }
            Self::Event { data, .. } => Envelope::new(frame_id, name, data),
        }
    }

    pub fn from_envelope(env: &Envelope) -> Result<Self, ProtocolError> {
        let name = env.name.as_str();
        let command = match name {
            names::WRITE => Self::Write(payload(env)?),
            names::UPDATE => Self::Update(payload(env)?),
            names::HTML_UPDATE => Self::HtmlUpdate(payload(env)?),
            names::SCROLL => Self::Scroll(payload(env)?),
            names::SET_FRAME_ID => Self::SetFrameId(payload(env)?),
            _ => match name.strip_prefix(names::FN_PREFIX) {
                Some(function) => Self::Call {
                    function: function.to_string(),
                    data: env.data.clone(),
                    run_id: env
                        .run_id
                        .clone()
                        .ok_or_else(|| ProtocolError::MissingRunId(env.name.clone()))?,
                },
                None => Self::Event {
                    name: env.name.clone(),
                    data: env.data.clone(),
                },
            },
        };
        Ok(command)
    }
}

// =============================================================================
// Frame -> Host
// =============================================================================

/// Messages a frame posts to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    DomContentLoaded,
    Load,
    Resize(DocumentSize),
    Scroll(ScrollPosition),
    MouseMove(PointerData),
    MouseEnter(PointerData),
    MouseLeave(PointerData),
    Click(PointerData),
    Resolve { run_id: RunId, value: Value },
    Reject { run_id: RunId, error: RemoteError },
    /// Consecutive structural patches failed to apply.
    PatchFailed { consecutive: u32 },
    /// Anything a frame script emits by name.
    Custom { name: String, data: Value },
}

impl FrameEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::DomContentLoaded => names::DOM_CONTENT_LOADED,
            Self::Load => names::LOAD,
            Self::Resize(_) => names::RESIZE,
            Self::Scroll(_) => names::SCROLL,
            Self::MouseMove(_) => names::MOUSE_MOVE,
            Self::MouseEnter(_) => names::MOUSE_ENTER,
            Self::MouseLeave(_) => names::MOUSE_LEAVE,
            Self::Click(_) => names::CLICK,
            Self::Resolve { .. } => names::RESOLVE,
            Self::Reject { .. } => names::REJECT,
            Self::PatchFailed { .. } => names::PATCH_FAILED,
            Self::Custom { name, .. } => name,
        }
    }

    pub fn into_envelope(self, frame_id: &FrameId) -> Envelope {
        let name = self.name().to_string();
        let frame_id = frame_id.clone();
        match self {
            Self::DomContentLoaded | Self::Load => Envelope::new(frame_id, name, Value::Null),
            Self::Resize(size) => Envelope::new(frame_id, name, to_value(&size)),
            Self::Scroll(pos) => Envelope::new(frame_id, name, to_value(&pos)),
            Self::MouseMove(p) | Self::MouseEnter(p) | Self::MouseLeave(p) | Self::Click(p) => {
                Envelope::new(frame_id, name, to_value(&p))
            }
            Self::Resolve { run_id, value } => {
                Envelope::new(frame_id, name, value).with_run_id(run_id)
            }
            Self::Reject { run_id, error } => {
                Envelope::new(frame_id, name, error.to_value()).with_run_id(run_id)
            }
            Self::PatchFailed { consecutive } => {
                Envelope::new(frame_id, name, json!({ "consecutive": consecutive }))
            }
            Self::Custom { data, .. } => Envelope::new(frame_id, name, data),
        }
    }

    pub fn from_envelope(env: &Envelope) -> Result<Self, ProtocolError> {
        let event = match env.name.as_str() {
            names::DOM_CONTENT_LOADED => Self::DomContentLoaded,
            names::LOAD => Self::Load,
            names::RESIZE => Self::Resize(payload(env)?),
            names::SCROLL => Self::Scroll(payload(env)?),
            names::MOUSE_MOVE => Self::MouseMove(payload(env)?),
            names::MOUSE_ENTER => Self::MouseEnter(payload(env)?),
            names::MOUSE_LEAVE => Self::MouseLeave(payload(env)?),
            names::CLICK => Self::Click(payload(env)?),
            names::RESOLVE => Self::Resolve {
                run_id: run_id(env)?,
                value: env.data.clone(),
            },
            names::REJECT => Self::Reject {
                run_id: run_id(env)?,
                error: RemoteError::from_value(env.data.clone()),
            },
            names::PATCH_FAILED => Self::PatchFailed {
                consecutive: env
                    .data
                    .get("consecutive")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as u32,
            },
            _ => Self::Custom {
                name: env.name.clone(),
                data: env.data.clone(),
            },
        };
        Ok(event)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn payload<T: DeserializeOwned>(env: &Envelope) -> Result<T, ProtocolError> {
    serde_json::from_value(env.data.clone()).map_err(|source| ProtocolError::Payload {
        name: env.name.clone(),
        source,
    })
}

fn run_id(env: &Envelope) -> Result<RunId, ProtocolError> {
    env.run_id
        .clone()
        .ok_or_else(|| ProtocolError::MissingRunId(env.name.clone()))
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
