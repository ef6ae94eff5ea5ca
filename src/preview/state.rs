//! Host-side view of a preview.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::frame::InstanceId;
use crate::protocol::{DocumentSize, FrameId, PointerData, ScrollPosition};

/// Last reported geometry of the active frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    /// `None` until the frame has reported a size
    pub size: Option<DocumentSize>,
    pub scroll: ScrollPosition,
}

/// Snapshot of a preview's observable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    /// A write or swap is in flight
    pub loading: bool,
    /// Id of the source the frame currently shows
    pub source_id: Option<String>,
    pub window: WindowState,
    /// Last pointer event; all fields empty after `mouseleave`
    pub mouse: PointerData,
    /// Most recent host-side failure (load timeout and the like)
    pub last_error: Option<String>,
}

pub(crate) type SharedState = Arc<RwLock<PreviewState>>;

/// Lifecycle notifications for observers.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    FrameCreated {
        instance: InstanceId,
        frame_id: FrameId,
    },
    /// The frame reported `load` for a written document
    FrameLoaded { instance: InstanceId },
    /// The frame now answers to the preview's frame id and is visible
    FrameActivated { instance: InstanceId },
    FrameDiscarded { instance: InstanceId },
    LoadingChanged(bool),
    /// A patch-class message went out (`update` or `html-update`)
    PatchSent { name: String },
    Error(String),
}
