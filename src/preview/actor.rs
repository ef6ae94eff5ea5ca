//! The preview actor: runs the sync engine against the frame lifecycle.
//!
//! ```text
//! Preview::set_source ──> mpsc ──┐
//! debounce deadline ─────────────┼──> SyncEngine ──Action──> FrameLifecycle
//! load task completion ──────────┤
//! patchFailed from the frame ────┘
//! ```
//!
//! Loads run as their own task so new sources keep arriving (and collapse
//! into the engine's rerun slot) while a swap is in flight.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::state::{PreviewEvent, SharedState};
use crate::error::PreviewError;
use crate::frame::FrameLifecycle;
use crate::protocol::Listener;
use crate::source::Source;
use crate::sync::{Action, SyncEngine, SyncState};

pub(crate) enum ActorMessage {
    SetSource(Source),
    Shutdown,
}

/// How far the actor has got, for `Preview::settle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Progress {
    /// Sources taken off the inbox so far
    pub processed: u64,
    pub state: SyncState,
}

type LoadTask = JoinHandle<Result<(), PreviewError>>;

pub(crate) struct PreviewActor {
    pub rx: mpsc::UnboundedReceiver<ActorMessage>,
    pub engine: SyncEngine,
    pub lifecycle: FrameLifecycle,
    pub state: SharedState,
    pub events: broadcast::Sender<PreviewEvent>,
    pub patch_failed: Listener,
    pub progress: watch::Sender<Progress>,
}

impl PreviewActor {
    pub async fn run(mut self) {
        let mut processed = 0;
        let mut load: Option<(String, LoadTask)> = None;

        loop {
            let deadline = self.engine.deadline();

            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(ActorMessage::SetSource(source)) => {
                        processed += 1;
                        let action = self.engine.submit(source, Instant::now());
                        self.execute(action, &mut load);
                    }
                    Some(ActorMessage::Shutdown) | None => break,
                },

                result = wait_load(&mut load) => {
                    let applied = match (load.take(), result) {
                        (Some((source_id, _)), Ok(())) => {
                            self.state.write().source_id = Some(source_id);
                            true
                        }
                        (_, Err(e)) => {
                            self.report_error(&e);
                            false
                        }
                        (None, Ok(())) => false,
                    };
                    let action = self.engine.on_load_complete(applied);
                    self.execute(action, &mut load);
                }

                Some(_) = self.patch_failed.next() => self.engine.on_patch_failed(),

                _ = sleep_until(deadline) => {
                    let action = self.engine.on_deadline(Instant::now());
                    self.execute(action, &mut load);
                }
            }

            self.set_loading(load.is_some());
            self.progress.send_replace(Progress {
                processed,
                state: self.engine.state(),
            });
        }

        if let Some((_, task)) = load {
            task.abort();
        }
        self.lifecycle.teardown();
        crate::debug!("sync"; "preview {} stopped", self.lifecycle.frame_id());
    }

    fn execute(&mut self, action: Option<Action>, load: &mut Option<(String, LoadTask)>) {
        match action {
            None => {}
            Some(Action::Patch { source_id, command }) => {
                let Some(frame) = self.lifecycle.active().load() else {
                    crate::debug!("sync"; "no active frame, dropping {}", command.name());
                    return;
                };
                let name = command.name();
                frame.publish(command);
                self.state.write().source_id = Some(source_id);
                self.emit(PreviewEvent::PatchSent { name });
            }
            Some(Action::Load {
                source,
                swap,
                reset_scroll,
            }) => {
                self.set_loading(true);
                let replay = (!reset_scroll).then(|| self.state.read().window.scroll);
                let lifecycle = self.lifecycle.clone();
                let Source { id, html } = source;

                let task = tokio::spawn(async move {
                    if swap {
                        lifecycle.swap(html, replay).await
                    } else {
                        lifecycle.rewrite(html, reset_scroll).await
                    }
                });
                *load = Some((id, task));
            }
        }
    }

    fn set_loading(&self, loading: bool) {
        let changed = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.loading, loading) != loading
        };
        if changed {
            self.emit(PreviewEvent::LoadingChanged(loading));
        }
    }

    fn report_error(&self, error: &PreviewError) {
        crate::log!("sync"; "{}", error);
        self.state.write().last_error = Some(error.to_string());
        self.emit(PreviewEvent::Error(error.to_string()));
    }

    fn emit(&self, event: PreviewEvent) {
        let _ = self.events.send(event);
    }
}

async fn wait_load(load: &mut Option<(String, LoadTask)>) -> Result<(), PreviewError> {
    match load {
        Some((_, task)) => task.await.unwrap_or(Err(PreviewError::Shutdown)),
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
