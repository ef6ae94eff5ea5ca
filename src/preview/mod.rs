//! Host-facing preview API.
//!
//! A [`Preview`] owns one logical frame on a [`HostChannel`]. Several
//! previews may share a channel; each only ever sees envelopes carrying its
//! own frame id.
//!
//! # Module Structure
//!
//! - `actor` - runs the sync engine and executes its actions
//! - `rpc` - `call()` with run-id correlation and timeout
//! - `state` - `PreviewState` and `PreviewEvent`
//! - `telemetry` - folds resize / scroll / pointer reports into the state

mod actor;
mod rpc;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

pub use state::{PreviewEvent, PreviewState, WindowState};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use actor::{ActorMessage, PreviewActor, Progress};
use state::SharedState;

use crate::config::PreviewConfig;
use crate::error::PreviewError;
use crate::frame::{ActiveFrame, FrameHandle, FrameLifecycle};
use crate::protocol::{FrameId, HostChannel, HostCommand, Listener, names};
use crate::runtime::{DomInput, ScriptEngine};
use crate::source::Source;
use crate::sync::{SyncEngine, SyncState};

/// Buffered lifecycle events per `events()` receiver.
const EVENT_CAPACITY: usize = 256;

pub struct Preview {
    frame_id: FrameId,
    channel: HostChannel,
    lifecycle: FrameLifecycle,
    active: ActiveFrame,
    state: SharedState,
    events: broadcast::Sender<PreviewEvent>,
    tx: mpsc::UnboundedSender<ActorMessage>,
    submitted: AtomicU64,
    progress: watch::Receiver<Progress>,
    call_timeout: Duration,
    actor: Mutex<Option<JoinHandle<()>>>,
    telemetry: JoinHandle<()>,
}

impl Preview {
    /// Mount a frame on `channel` and start syncing `source` into it.
    ///
    /// Returns once the frame has booted; the first document loads in the
    /// background (watch `state().loading` or call [`settle`](Self::settle)).
    pub async fn mount(
        channel: &HostChannel,
        config: PreviewConfig,
        source: Source,
        scripts: Arc<dyn ScriptEngine>,
    ) -> Result<Self, PreviewError> {
        config.validate()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state: SharedState = Arc::new(RwLock::new(PreviewState::default()));
        let lifecycle = FrameLifecycle::new(&config, channel.clone(), scripts, events.clone());
        let frame_id = lifecycle.frame_id().clone();

        let telemetry = telemetry::spawn(channel, frame_id.clone(), Arc::clone(&state));
        if let Err(e) = lifecycle.mount().await {
            telemetry.abort();
            lifecycle.teardown();
            return Err(e);
        }
        crate::debug!("sync"; "mounted {} ({})", frame_id, config.title);

        let (tx, rx) = mpsc::unbounded_channel();
        let (progress_tx, progress) = watch::channel(Progress {
            processed: 0,
            state: SyncState::Idle,
        });
        let actor = PreviewActor {
            rx,
            engine: SyncEngine::new(config.mode, config.sync.strategy, config.sync.debounce()),
            lifecycle: lifecycle.clone(),
            state: Arc::clone(&state),
            events: events.clone(),
            patch_failed: channel.listen(frame_id.clone(), names::PATCH_FAILED),
            progress: progress_tx,
        };

        let preview = Self {
            active: lifecycle.active(),
            frame_id,
            channel: channel.clone(),
            lifecycle,
            state,
            events,
            tx,
            submitted: AtomicU64::new(0),
            progress,
            call_timeout: config.frame.call_timeout(),
            actor: Mutex::new(Some(tokio::spawn(actor.run()))),
            telemetry,
        };
        preview.set_source(source);
        Ok(preview)
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    /// Hand a new source to the sync engine.
    pub fn set_source(&self, source: Source) {
        if self.tx.send(ActorMessage::SetSource(source)).is_ok() {
            self.submitted.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Wait until every submitted source has been applied and nothing is
    /// pending (debounce included).
    pub async fn settle(&self) {
        let target = self.submitted.load(Ordering::SeqCst);
        let mut progress = self.progress.clone();
        let _ = progress
            .wait_for(|p| p.processed >= target && p.state == SyncState::Idle)
            .await;
    }

    /// Call a function defined by the frame's scripts.
    pub async fn call(&self, function: &str, data: Value) -> Result<Value, PreviewError> {
        rpc::call(&self.channel, &self.active, function, data, self.call_timeout).await
    }

    /// Deliver an ad hoc event to the frame's listeners.
    pub fn emit(&self, name: &str, data: Value) {
        if let Some(frame) = self.active.load() {
            frame.publish(HostCommand::Event {
                name: name.to_string(),
                data,
            });
        }
    }

    /// Listen for one message name from this preview's frame.
    pub fn subscribe(&self, name: &str) -> Listener {
        self.channel.listen(self.frame_id.clone(), name)
    }

    pub fn state(&self) -> PreviewState {
        self.state.read().clone()
    }

    pub fn events(&self) -> broadcast::Receiver<PreviewEvent> {
        self.events.subscribe()
    }

    /// Send user input to the visible frame.
    pub fn input(&self, input: DomInput) -> bool {
        self.active.load().is_some_and(|frame| frame.input(input))
    }

    pub fn active_frame(&self) -> Option<Arc<FrameHandle>> {
        self.active.load()
    }

    /// Every mounted frame, staging frames included.
    pub fn frames(&self) -> Vec<Arc<FrameHandle>> {
        self.lifecycle.container().frames()
    }

    /// Stop syncing and remove every frame.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(ActorMessage::Shutdown);
        let actor = self.actor.lock().take();
        if let Some(actor) = actor {
            let _ = actor.await;
        }
        self.telemetry.abort();
        self.lifecycle.teardown();
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        if let Some(actor) = self.actor.lock().take() {
            actor.abort();
        }
        self.telemetry.abort();
        self.lifecycle.teardown();
    }
}
