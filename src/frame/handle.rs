//! Host-side handle to one frame.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dom::Viewport;
use crate::protocol::{Envelope, FrameId, HostChannel, HostCommand};
use crate::runtime::{DomInput, FrameRuntime, RuntimeOptions, ScriptEngine};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one frame instance, independent of its routing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Presentation of a frame in its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStyle {
    Visible,
    /// Loaded off-screen while staging a swap
    Hidden,
}

impl FrameStyle {
    pub fn css(self) -> &'static str {
        match self {
            Self::Visible => "width: 100%; height: 100%; border: 0;",
            Self::Hidden => {
                "width: 100%; height: 100%; border: 0; position: absolute; visibility: hidden;"
            }
        }
    }
}

/// Frame element attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAttrs {
    pub title: String,
    pub sandbox: String,
    pub allow: String,
}

pub struct FrameHandle {
    instance: InstanceId,
    /// Id the frame was created under (`id` attribute)
    element_id: FrameId,
    /// Id the host currently addresses the frame by
    routing_id: RwLock<FrameId>,
    style: RwLock<FrameStyle>,
    attrs: FrameAttrs,
    /// Last size the frame was given
    viewport: Mutex<Viewport>,
    inbox: mpsc::UnboundedSender<Envelope>,
    input: mpsc::UnboundedSender<DomInput>,
    channel: HostChannel,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FrameHandle {
    /// Create a frame and boot its runtime.
    pub fn spawn(
        frame_id: FrameId,
        style: FrameStyle,
        attrs: FrameAttrs,
        channel: HostChannel,
        scripts: Arc<dyn ScriptEngine>,
        viewport: Viewport,
        options: RuntimeOptions,
    ) -> Arc<Self> {
        let runtime = FrameRuntime::spawn(
            frame_id.clone(),
            channel.clone(),
            scripts,
            viewport,
            options,
        );
        let handle = Arc::new(Self {
            instance: InstanceId::next(),
            element_id: frame_id.clone(),
            routing_id: RwLock::new(frame_id),
            style: RwLock::new(style),
            attrs,
            viewport: Mutex::new(viewport),
            inbox: runtime.inbox,
            input: runtime.input,
            channel,
            task: Mutex::new(Some(runtime.task)),
        });
        crate::debug!("frame"; "created {} as {}", handle.instance, handle.element_id);
        handle
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn element_id(&self) -> &FrameId {
        &self.element_id
    }

    pub fn frame_id(&self) -> FrameId {
        self.routing_id.read().clone()
    }

    pub fn style(&self) -> FrameStyle {
        *self.style.read()
    }

    pub fn set_style(&self, style: FrameStyle) {
        *self.style.write() = style;
    }

    pub fn attrs(&self) -> &FrameAttrs {
        &self.attrs
    }

    /// Send a command to the frame.
    ///
    /// Returns false when the frame is already gone; the command is dropped
    /// like a message posted to a removed window.
    pub fn publish(&self, command: HostCommand) -> bool {
        if let HostCommand::SetFrameId(frame_id) = &command {
            *self.routing_id.write() = frame_id.clone();
        }

        let envelope = command.into_envelope(&self.frame_id());
        self.channel.record_outbound(&envelope);
        if self.inbox.send(envelope).is_err() {
            crate::debug!("frame"; "{} is gone, message dropped", self.instance);
            return false;
        }
        true
    }

    pub fn viewport(&self) -> Viewport {
        *self.viewport.lock()
    }

    /// Deliver simulated user input.
    pub fn input(&self, input: DomInput) -> bool {
        let resized = match &input {
            DomInput::Resize(viewport) => Some(*viewport),
            _ => None,
        };
        if self.input.send(input).is_err() {
            return false;
        }
        if let Some(viewport) = resized {
            *self.viewport.lock() = viewport;
        }
        true
    }

    pub fn is_attached(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Tear the frame down. Its runtime stops immediately.
    pub(crate) fn detach(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            crate::debug!("frame"; "removed {} ({})", self.instance, self.frame_id());
        }
    }
}

impl fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameHandle")
            .field("instance", &self.instance)
            .field("frame_id", &self.frame_id())
            .field("style", &self.style())
            .finish()
    }
}
