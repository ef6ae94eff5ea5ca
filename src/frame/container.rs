//! Ordered set of frames mounted for one preview.
//!
//! A staging frame is prepended so it sits before the visible one; at most
//! two frames exist at any time.

use std::sync::Arc;

use parking_lot::Mutex;

use super::handle::{FrameHandle, InstanceId};

#[derive(Default)]
pub struct FrameContainer {
    frames: Mutex<Vec<Arc<FrameHandle>>>,
}

impl FrameContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, frame: Arc<FrameHandle>) {
        self.frames.lock().push(frame);
    }

    pub fn prepend(&self, frame: Arc<FrameHandle>) {
        self.frames.lock().insert(0, frame);
    }

    /// Remove and tear down a frame.
    pub fn remove(&self, instance: InstanceId) -> Option<Arc<FrameHandle>> {
        let mut frames = self.frames.lock();
        let index = frames.iter().position(|f| f.instance() == instance)?;
        let frame = frames.remove(index);
        frame.detach();
        Some(frame)
    }

    pub fn contains(&self, instance: InstanceId) -> bool {
        self.frames.lock().iter().any(|f| f.instance() == instance)
    }

    /// Frames in document order.
    pub fn frames(&self) -> Vec<Arc<FrameHandle>> {
        self.frames.lock().clone()
    }

    pub fn instances(&self) -> Vec<InstanceId> {
        self.frames.lock().iter().map(|f| f.instance()).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Remove and tear down every frame.
    pub fn clear(&self) {
        for frame in self.frames.lock().drain(..) {
            frame.detach();
        }
    }
}
