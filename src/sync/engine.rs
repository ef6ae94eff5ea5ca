//! The sync decision state machine.
//!
//! Pure: it never touches frames or clocks. The caller feeds it sources,
//! deadlines and completions and executes the returned [`Action`]s.

use std::time::Duration;

use tokio::time::Instant;

use super::debouncer::Debouncer;
use crate::diff::{DocumentSnapshot, PatchStrategy, Plan, StrategyKind};
use crate::protocol::HostCommand;
use crate::source::{Mode, RenderMode, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// A write or swap is in flight
    Loading,
    /// A same-id edit waits for the debounce window
    Patching,
}

/// Work the caller must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Load a full document. `swap` goes through a staging frame; otherwise
    /// the active frame is rewritten in place. Report the outcome with
    /// [`SyncEngine::on_load_complete`].
    Load {
        source: Source,
        swap: bool,
        reset_scroll: bool,
    },
    /// Send a patch-class command to the active frame. Fire and forget.
    Patch {
        source_id: String,
        command: HostCommand,
    },
}

impl Action {
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load { .. })
    }
}

pub struct SyncEngine {
    mode: Mode,
    strategy: Box<dyn PatchStrategy>,
    state: SyncState,
    debouncer: Debouncer,

    /// Last source the frame actually shows
    applied: Option<Source>,
    /// Render mode of `applied`
    render: Option<RenderMode>,
    /// Tree the frame holds, for diffing; dropped after patch failures
    baseline: Option<DocumentSnapshot>,

    pending: Option<Source>,
    in_flight: Option<(Source, RenderMode)>,
    /// Latest source submitted while loading
    rerun: Option<Source>,
}

impl SyncEngine {
    pub fn new(mode: Mode, strategy: StrategyKind, debounce: Duration) -> Self {
        Self {
            mode,
            strategy: strategy.build(),
            state: SyncState::Idle,
            debouncer: Debouncer::new(debounce),
            applied: None,
            render: None,
            baseline: None,
            pending: None,
            in_flight: None,
            rerun: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SyncState::Loading
    }

    /// Id of the source currently shown, if any.
    pub fn applied_id(&self) -> Option<&str> {
        self.applied.as_ref().map(|s| s.id.as_str())
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// When [`on_deadline`](Self::on_deadline) should next be called.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// A new source arrived from the host.
    pub fn submit(&mut self, source: Source, now: Instant) -> Option<Action> {
        if self.state == SyncState::Loading {
            crate::debug!("sync"; "loading, `{}` queued as rerun", source.id);
            self.rerun = Some(source);
            return None;
        }

        let render = self.mode.resolve(&source.html);
        if self.is_navigation(&source) || self.render != Some(render) {
            self.debouncer.cancel();
            self.pending = None;
            return Some(self.start_load(source, render));
        }

        if self.pending.is_none() && self.applied.as_ref() == Some(&source) {
            return None;
        }

        self.pending = Some(source);
        self.debouncer.arm(now);
        self.state = SyncState::Patching;
        None
    }

    /// The debounce deadline passed.
    pub fn on_deadline(&mut self, now: Instant) -> Option<Action> {
        if !self.debouncer.take_if_ready(now) {
            return None;
        }
        let source = self.pending.take()?;
        self.state = SyncState::Idle;
        self.apply_edit(source)
    }

    /// The load started by the last [`Action::Load`] finished.
    ///
    /// A queued rerun is replayed right away, without debounce.
    pub fn on_load_complete(&mut self, applied: bool) -> Option<Action> {
        let (source, render) = self.in_flight.take()?;
        self.state = SyncState::Idle;

        if applied {
            self.baseline = Some(DocumentSnapshot::parse(&source.html));
            self.render = Some(render);
            self.applied = Some(source);
        } else {
            crate::debug!("sync"; "load of `{}` failed, keeping `{}`", source.id, self.applied_id().unwrap_or("-"));
        }

        let next = self.rerun.take()?;
        let render = self.mode.resolve(&next.html);
        if self.is_navigation(&next) || self.render != Some(render) {
            return Some(self.start_load(next, render));
        }
        self.apply_edit(next)
    }

    /// The frame reported repeated patch failures; diff from scratch next time.
    pub fn on_patch_failed(&mut self) {
        crate::log!("sync"; "frame rejected patches, next edit re-sends the whole document");
        self.baseline = None;
    }

    fn is_navigation(&self, source: &Source) -> bool {
        self.applied.as_ref().is_none_or(|applied| applied.id != source.id)
    }

    fn start_load(&mut self, source: Source, render: RenderMode) -> Action {
        let initial = self.applied.is_none();
        let navigation = self.is_navigation(&source);
        let mode_changed = self.render.is_some_and(|current| current != render);

        let swap = !initial && (render == RenderMode::Refresh || mode_changed);
        crate::debug!(
            "sync";
            "load `{}` ({:?}, {})",
            source.id,
            render,
            if swap { "swap" } else { "in place" }
        );

        self.state = SyncState::Loading;
        self.in_flight = Some((source.clone(), render));
        Action::Load {
            source,
            swap,
            reset_scroll: navigation,
        }
    }

    /// Same-id edit whose render mode matches the frame.
    fn apply_edit(&mut self, source: Source) -> Option<Action> {
        match self.render {
            Some(RenderMode::Instant) => {
                let next = DocumentSnapshot::parse(&source.html);
                let plan = match &self.baseline {
                    Some(baseline) => self.strategy.plan(baseline, &next),
                    None => Plan::HtmlUpdate(next.to_html()),
                };
                self.baseline = Some(next);
                let source_id = source.id.clone();
                self.applied = Some(source);

                let command = plan.into_command()?;
                Some(Action::Patch { source_id, command })
            }
            Some(RenderMode::Refresh) | None => {
                if self.applied.as_ref() == Some(&source) {
                    return None;
                }
                Some(self.start_load(source, RenderMode::Refresh))
            }
        }
    }
}
