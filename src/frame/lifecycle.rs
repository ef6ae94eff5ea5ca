//! Frame lifecycle: mount, in-place writes and the seamless swap.
//!
//! A swap loads the new document into a hidden staging frame that answers
//! to `TEMP_<id>`. Only after it reports `load` is the visible frame removed
//! and the staging frame shown and rebound to the logical id, so the user
//! never sees a blank or half-loaded document.
//!
//! ```text
//! create TEMP frame (hidden, prepended)
//!   -> DOMContentLoaded -> write(html) -> load
//!   -> [replay scroll] -> remove old -> show -> setFrameId(id) -> active
//! ```
//!
//! The staging frame boots at the viewport of the frame it replaces, so the
//! replayed scroll is clamped against the size the user sees.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;

use super::container::FrameContainer;
use super::handle::{FrameAttrs, FrameHandle, FrameStyle};
use crate::config::PreviewConfig;
use crate::error::PreviewError;
use crate::preview::PreviewEvent;
use crate::dom::Viewport;
use crate::protocol::{FrameId, HostChannel, HostCommand, ScrollPosition, names};
use crate::runtime::{RuntimeOptions, ScriptEngine};

/// Read-only view of the frame currently receiving commands.
#[derive(Clone, Default)]
pub struct ActiveFrame(Arc<ArcSwapOption<FrameHandle>>);

impl ActiveFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Option<Arc<FrameHandle>> {
        self.0.load_full()
    }

    pub fn is_empty(&self) -> bool {
        self.0.load().is_none()
    }
}

/// Owns frame creation and removal for one preview.
///
/// Clones share the same container and active slot.
#[derive(Clone)]
pub struct FrameLifecycle {
    frame_id: FrameId,
    attrs: FrameAttrs,
    channel: HostChannel,
    container: Arc<FrameContainer>,
    active: ActiveFrame,
    scripts: Arc<dyn ScriptEngine>,
    runtime: RuntimeOptions,
    load_timeout: Duration,
    events: broadcast::Sender<PreviewEvent>,
}

impl FrameLifecycle {
    pub fn new(
        config: &PreviewConfig,
        channel: HostChannel,
        scripts: Arc<dyn ScriptEngine>,
        events: broadcast::Sender<PreviewEvent>,
    ) -> Self {
        Self {
            frame_id: FrameId::for_title(&config.title),
            attrs: FrameAttrs {
                title: config.title.clone(),
                sandbox: config.frame.sandbox.clone(),
                allow: config.frame.allow.clone(),
            },
            channel,
            container: Arc::new(FrameContainer::new()),
            active: ActiveFrame::empty(),
            scripts,
            runtime: RuntimeOptions::from_config(config),
            load_timeout: config.frame.load_timeout(),
            events,
        }
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    pub fn active(&self) -> ActiveFrame {
        self.active.clone()
    }

    pub fn container(&self) -> &FrameContainer {
        &self.container
    }

    fn create(
        &self,
        frame_id: FrameId,
        style: FrameStyle,
        viewport: Viewport,
    ) -> Arc<FrameHandle> {
        let frame = FrameHandle::spawn(
            frame_id.clone(),
            style,
            self.attrs.clone(),
            self.channel.clone(),
            Arc::clone(&self.scripts),
            viewport,
            self.runtime.clone(),
        );
        self.emit(PreviewEvent::FrameCreated {
            instance: frame.instance(),
            frame_id,
        });
        frame
    }

    /// Create the first, visible frame and wait for it to boot.
    pub async fn mount(&self) -> Result<Arc<FrameHandle>, PreviewError> {
        let booted = self
            .channel
            .listen(self.frame_id.clone(), names::DOM_CONTENT_LOADED);

        let frame = self.create(self.frame_id.clone(), FrameStyle::Visible, Viewport::default());
        self.container.append(Arc::clone(&frame));
        self.active.0.store(Some(Arc::clone(&frame)));
        frame.publish(HostCommand::SetFrameId(self.frame_id.clone()));
        self.emit(PreviewEvent::FrameActivated {
            instance: frame.instance(),
        });

        booted.wait(self.load_timeout).await?;
        Ok(frame)
    }

    /// Write a document into the active frame and wait for `load`.
    pub async fn rewrite(&self, html: String, reset_scroll: bool) -> Result<(), PreviewError> {
        let frame = self.active.load().ok_or(PreviewError::Shutdown)?;

        let loaded = self.channel.listen(frame.frame_id(), names::LOAD);
        frame.publish(HostCommand::Write(html));
        loaded.wait(self.load_timeout).await?;
        self.emit(PreviewEvent::FrameLoaded {
            instance: frame.instance(),
        });

        if reset_scroll {
            frame.publish(HostCommand::Scroll(ScrollPosition::ORIGIN));
        }
        Ok(())
    }

    /// Replace the visible frame with a freshly loaded one.
    ///
    /// `scroll` is replayed into the new frame before it is shown; `None`
    /// means navigation and the new frame is scrolled to the origin. On
    /// failure the staging frame is discarded and the old frame stays.
    pub async fn swap(
        &self,
        html: String,
        scroll: Option<ScrollPosition>,
    ) -> Result<(), PreviewError> {
        let staging_id = self.frame_id.staging();
        let booted = self
            .channel
            .listen(staging_id.clone(), names::DOM_CONTENT_LOADED);
        let loaded = self.channel.listen(staging_id.clone(), names::LOAD);

        // Same container, same size as the frame it replaces
        let viewport = self
            .active
            .load()
            .map_or_else(Viewport::default, |frame| frame.viewport());
        let staging = self.create(staging_id, FrameStyle::Hidden, viewport);
        self.container.prepend(Arc::clone(&staging));

        let result = async {
            booted.wait(self.load_timeout).await?;
            staging.publish(HostCommand::Write(html));
            loaded.wait(self.load_timeout).await?;
            Ok::<_, PreviewError>(())
        }
        .await;

        if let Err(e) = result {
            crate::log!("swap"; "discarding staging frame: {}", e);
            self.container.remove(staging.instance());
            self.emit(PreviewEvent::FrameDiscarded {
                instance: staging.instance(),
            });
            return Err(e);
        }
        self.emit(PreviewEvent::FrameLoaded {
            instance: staging.instance(),
        });

        if let Some(position) = scroll {
            staging.publish(HostCommand::Scroll(position));
        }

        if let Some(old) = self.active.load() {
            self.container.remove(old.instance());
            self.emit(PreviewEvent::FrameDiscarded {
                instance: old.instance(),
            });
        }

        staging.set_style(FrameStyle::Visible);
        staging.publish(HostCommand::SetFrameId(self.frame_id.clone()));
        self.active.0.store(Some(Arc::clone(&staging)));
        self.emit(PreviewEvent::FrameActivated {
            instance: staging.instance(),
        });
        crate::debug_do! {
            let frames = self.container.instances();
            crate::log!("swap"; "{} is now active as {}, frames {:?}", staging.instance(), self.frame_id, frames);
        }

        if scroll.is_none() {
            staging.publish(HostCommand::Scroll(ScrollPosition::ORIGIN));
        }
        Ok(())
    }

    /// Remove every frame.
    pub fn teardown(&self) {
        self.active.0.store(None);
        self.container.clear();
    }

    fn emit(&self, event: PreviewEvent) {
        let _ = self.events.send(event);
    }
}
