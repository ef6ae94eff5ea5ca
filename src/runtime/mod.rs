//! Frame Runtime
//!
//! The code that lives inside every preview frame. It runs as one actor per
//! frame, owning its document and registry:
//!
//! ```text
//! host --HostCommand--> inbox ─┐
//! user --DomInput-----> input ─┼─> FrameRuntime ──FrameEvent──> HostChannel
//!                    timers ───┘
//! ```
//!
//! # Module Structure
//!
//! - `document` - live tree, ready state, scroll and viewport
//! - `registry` - remote functions, listeners and frame identity
//! - `script` - the `ScriptEngine` seam and `FrameScope`
//! - `throttle` - leading/trailing throttle for telemetry
//! - `pointer` - `DomInput` and enter/leave synthesis

pub mod document;
pub mod pointer;
pub mod registry;
pub mod script;
pub mod throttle;


pub use document::{Document, ReadyState};
pub use pointer::{DomInput, PointerTracker};
pub use registry::{FrameRegistry, FunctionHandler, RegistryError};
pub use script::{Emitter, FrameScope, NoScripts, ScriptEngine, ScriptError, ScriptStatus, scripts};
pub use throttle::Throttle;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::config::PreviewConfig;
use crate::diff;
use crate::dom::{Viewport, parse_document};
use crate::protocol::{
    DocumentSize, Envelope, FrameEvent, FrameId, HostChannel, HostCommand, PointerData,
    RemoteError, RunId,
};

/// Telemetry rate: one event per animation frame at 30 fps.
const FRAME_INTERVAL: Duration = Duration::from_micros(33_333);
/// Quiet time after the last resize before `isResizing` clears.
const RESIZE_SETTLE: Duration = Duration::from_millis(250);
/// Grace window between `out` and `over` that still counts as inside.
const LEAVE_GRACE: Duration = Duration::from_millis(10);

/// Timing knobs of a frame runtime.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub frame_interval: Duration,
    pub resize_settle: Duration,
    pub leave_grace: Duration,
    /// Interval of the readiness poll that produces `load`
    pub ready_poll: Duration,
    /// Poll attempts before giving up on `load`
    pub ready_poll_limit: u32,
    /// Failed `update`s in a row before `patchFailed` is reported (0 = never)
    pub max_patch_failures: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            frame_interval: FRAME_INTERVAL,
            resize_settle: RESIZE_SETTLE,
            leave_grace: LEAVE_GRACE,
            ready_poll: Duration::from_millis(50),
            ready_poll_limit: 200,
            max_patch_failures: 3,
        }
    }
}

impl RuntimeOptions {
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            ready_poll: config.frame.ready_poll(),
            ready_poll_limit: config.frame.ready_poll_limit,
            max_patch_failures: config.sync.max_patch_failures,
            ..Self::default()
        }
    }
}

/// Sending ends of a spawned runtime.
pub struct RuntimeChannels {
    pub inbox: mpsc::UnboundedSender<Envelope>,
    pub input: mpsc::UnboundedSender<DomInput>,
    pub task: JoinHandle<()>,
}

struct ReadyPoll {
    next: Instant,
    attempts: u32,
}

pub struct FrameRuntime {
    inbox: mpsc::UnboundedReceiver<Envelope>,
    input: mpsc::UnboundedReceiver<DomInput>,
    registry: FrameRegistry,
    emitter: Emitter,
    scripts: Arc<dyn ScriptEngine>,
    /// In-flight function calls; they die with the script context
    handlers: JoinSet<()>,
    document: Document,
    options: RuntimeOptions,

    listening: bool,
    pointer: PointerTracker,
    mouse_move: Throttle<PointerData>,
    scroll: Throttle<()>,
    resize: Throttle<()>,
    resize_settle: Option<Instant>,
    ready_poll: Option<ReadyPoll>,
    last_size: Option<DocumentSize>,
    patch_failures: u32,
}

impl FrameRuntime {
    /// Boot a frame with a blank document sized to `viewport` and start its
    /// event loop.
    pub fn spawn(
        frame_id: FrameId,
        channel: HostChannel,
        scripts: Arc<dyn ScriptEngine>,
        viewport: Viewport,
        options: RuntimeOptions,
    ) -> RuntimeChannels {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (input_tx, input) = mpsc::unbounded_channel();

        let registry = FrameRegistry::new(frame_id);
        let emitter = Emitter::new(channel, registry.meta());

        let runtime = Self {
            inbox,
            input,
            registry,
            emitter,
            scripts,
            handlers: JoinSet::new(),
            document: Document::blank(viewport),
            listening: false,
            pointer: PointerTracker::new(options.leave_grace),
            mouse_move: Throttle::new(options.frame_interval),
            scroll: Throttle::new(options.frame_interval),
            resize: Throttle::new(options.frame_interval),
            resize_settle: None,
            ready_poll: None,
            last_size: None,
            patch_failures: 0,
            options,
        };

        RuntimeChannels {
            inbox: inbox_tx,
            input: input_tx,
            task: tokio::spawn(runtime.run()),
        }
    }

    async fn run(mut self) {
        self.emitter.send(FrameEvent::DomContentLoaded);
        self.add_listeners();

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                biased;
                msg = self.inbox.recv() => match msg {
                    Some(envelope) => self.on_message(envelope),
                    None => break,
                },
                Some(input) = self.input.recv() => self.on_input(input, Instant::now()),
                _ = sleep_until(deadline) => self.on_timers(Instant::now()),
                Some(_) = self.handlers.join_next() => {}
            }
        }

        self.handlers.abort_all();

        crate::debug!("frame"; "{} detached", self.registry.frame_id());
    }

    // =========================================================================
    // Host commands
    // =========================================================================

    fn on_message(&mut self, envelope: Envelope) {
        let command = match HostCommand::from_envelope(&envelope) {
            Ok(command) => command,
            Err(e) => {
                crate::debug!("frame"; "dropping `{}`: {}", envelope.name, e);
                return;
            }
        };

        let now = Instant::now();
        match command {
            HostCommand::Write(html) => self.write(&html, now),
            HostCommand::Update(ops) => self.update(&ops, now),
            HostCommand::HtmlUpdate(html) => {
                self.document.replace_tree(parse_document(&html));
                self.patch_failures = 0;
                self.observe_size(now);
            }
            HostCommand::Scroll(position) => {
                self.document.scroll_to(position);
                self.report_scroll(now);
            }
            HostCommand::SetFrameId(frame_id) => {
                self.registry.set_frame_id(frame_id);
                self.announce_size();
                self.emitter.send(FrameEvent::Scroll(self.document.scroll()));
            }
            HostCommand::Call {
                function,
                data,
                run_id,
            } => self.call(&function, data, run_id),
            HostCommand::Event { name, data } => {
                for listener in self.registry.listeners(&name) {
                    listener(&data);
                }
            }
        }
    }

    /// Full document replacement: fresh registries, scripts re-run.
    fn write(&mut self, html: &str, now: Instant) {
        self.remove_listeners();
        self.handlers.abort_all();
        self.registry.reset_registries();
        self.patch_failures = 0;

        self.document.write(html);
        let suspended = self.run_scripts();
        self.document.close(suspended);

        self.add_listeners();
        self.ready_poll = Some(ReadyPoll {
            next: now + self.options.ready_poll,
            attempts: 0,
        });
    }

    /// Run every inline script. Returns true if any kept the load pending.
    fn run_scripts(&mut self) -> bool {
        let mut suspended = false;
        for source in self.document.scripts() {
            let mut scope = FrameScope::new(&mut self.registry, &self.emitter);
            match self.scripts.run(&source, &mut scope) {
                Ok(ScriptStatus::Settled) => {}
                Ok(ScriptStatus::Suspended) => suspended = true,
                Err(e) => crate::log!("frame"; "script error: {}", e),
            }
        }
        suspended
    }

    fn update(&mut self, ops: &[diff::PatchOp], now: Instant) {
        match diff::apply(self.document.root_mut(), ops) {
            Ok(()) => {
                self.patch_failures = 0;
                self.observe_size(now);
            }
            Err(e) => {
                self.patch_failures += 1;
                crate::debug!("frame"; "patch failed ({} in a row): {}", self.patch_failures, e);

                let max = self.options.max_patch_failures;
                if max > 0 && self.patch_failures >= max {
                    self.emitter.send(FrameEvent::PatchFailed {
                        consecutive: self.patch_failures,
                    });
                    self.patch_failures = 0;
                }
            }
        }
    }

    fn call(&mut self, function: &str, data: Value, run_id: RunId) {
        let Some(handler) = self.registry.function(function) else {
            self.emitter.send(FrameEvent::Reject {
                run_id,
                error: RemoteError::not_defined(function),
            });
            return;
        };

        let emitter = self.emitter.clone();
        self.handlers.spawn(async move {
            let event = match handler(data).await {
                Ok(value) => FrameEvent::Resolve { run_id, value },
                Err(error) => FrameEvent::Reject { run_id, error },
            };
            emitter.send(event);
        });
    }

    // =========================================================================
    // User input
    // =========================================================================

    fn on_input(&mut self, input: DomInput, now: Instant) {
        if !self.listening {
            return;
        }

        match input {
            DomInput::PointerOver { target, x, y } => {
                if self.pointer.over() {
                    let data = PointerData::hover(self.document.locate(&target), x, y);
                    self.emitter.send(FrameEvent::MouseEnter(data));
                }
            }
            DomInput::PointerOut => self.pointer.out(now),
            DomInput::PointerMove { target, x, y } => {
                let data = PointerData::hover(self.document.locate(&target), x, y);
                if let Some(data) = self.mouse_move.submit(now, data) {
                    self.emit_mouse_move(data);
                }
            }
            DomInput::Click { target, x, y } => {
                let data = PointerData::click(self.document.locate(&target), x, y);
                self.emitter.send(FrameEvent::Click(data));
            }
            DomInput::Scroll(position) => {
                self.document.scroll_to(position);
                self.report_scroll(now);
            }
            DomInput::Resize(viewport) => {
                self.document.set_viewport(viewport);
                self.observe_size(now);
            }
        }
    }

    /// A throttled move can land after the pointer left; drop it then.
    fn emit_mouse_move(&self, data: PointerData) {
        if self.pointer.is_inside() {
            self.emitter.send(FrameEvent::MouseMove(data));
        }
    }

    fn report_scroll(&mut self, now: Instant) {
        if self.scroll.submit(now, ()).is_some() {
            self.emitter.send(FrameEvent::Scroll(self.document.scroll()));
        }
    }

    /// Resize observer: only real dimension changes count.
    fn observe_size(&mut self, now: Instant) {
        let size = self.document.size();
        if self
            .last_size
            .is_some_and(|last| last.same_dimensions(&size))
        {
            return;
        }
        self.last_size = Some(size);

        if self.resize.submit(now, ()).is_some() {
            self.fire_resize(now);
        }
    }

    fn fire_resize(&mut self, now: Instant) {
        self.emitter.send(FrameEvent::Resize(DocumentSize {
            is_resizing: true,
            ..self.document.size()
        }));
        self.resize_settle = Some(now + self.options.resize_settle);
    }

    /// Report the settled size immediately.
    fn announce_size(&mut self) {
        let size = self.document.size();
        self.last_size = Some(size);
        self.emitter.send(FrameEvent::Resize(size));
    }

    // =========================================================================
    // Listeners and timers
    // =========================================================================

    fn add_listeners(&mut self) {
        self.listening = true;
        self.announce_size();
    }

    fn remove_listeners(&mut self) {
        self.listening = false;
        self.pointer.reset();
        self.mouse_move.cancel();
        self.scroll.cancel();
        self.resize.cancel();
        self.resize_settle = None;
        self.ready_poll = None;
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.pointer.deadline(),
            self.mouse_move.deadline(),
            self.scroll.deadline(),
            self.resize.deadline(),
            self.resize_settle,
            self.ready_poll.as_ref().map(|poll| poll.next),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn on_timers(&mut self, now: Instant) {
        if self.pointer.take_leave(now) {
            self.emitter.send(FrameEvent::MouseLeave(PointerData::left()));
        }

        if let Some(data) = self.mouse_move.take_due(now) {
            self.emit_mouse_move(data);
        }

        if self.scroll.take_due(now).is_some() {
            self.emitter.send(FrameEvent::Scroll(self.document.scroll()));
        }

        if self.resize.take_due(now).is_some() {
            self.fire_resize(now);
        } else if self.resize_settle.is_some_and(|at| at <= now) {
            self.resize_settle = None;
            self.emitter.send(FrameEvent::Resize(self.document.size()));
        }

        self.poll_ready(now);
    }

    fn poll_ready(&mut self, now: Instant) {
        let Some(poll) = self.ready_poll.as_mut() else {
            return;
        };
        if poll.next > now {
            return;
        }

        if self.document.is_ready() {
            self.ready_poll = None;
            self.emitter.send(FrameEvent::Load);
            return;
        }

        poll.attempts += 1;
        if poll.attempts >= self.options.ready_poll_limit {
            crate::log!("frame"; "{} never finished loading", self.registry.frame_id());
            self.ready_poll = None;
        } else {
            poll.next = now + self.options.ready_poll;
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
