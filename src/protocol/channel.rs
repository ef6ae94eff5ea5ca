//! The ordered host message channel.
//!
//! Frames post envelopes into a single broadcast channel that every preview
//! on the host listens to, mirroring how all frames share one window message
//! bus. Each listener filters by `frameId` (and, for RPC, by `runId`).
//!
//! Host-to-frame traffic does not go through here; it is delivered straight
//! into the target frame's inbox. A copy is mirrored onto the outbound tap so
//! tooling and tests can observe what the host sent.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::envelope::{Envelope, FrameId};
use crate::error::PreviewError;

/// Buffered envelopes per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 1024;

/// Shared message bus between the host and all frames.
#[derive(Clone)]
pub struct HostChannel {
    inbound: broadcast::Sender<Envelope>,
    outbound: broadcast::Sender<Envelope>,
}

impl HostChannel {
    pub fn new() -> Self {
        let (inbound, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (outbound, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { inbound, outbound }
    }

    /// Post an envelope from a frame to the host.
    ///
    /// With no subscribers the envelope is dropped, like a message to a
    /// window nobody listens on.
    pub fn post(&self, envelope: Envelope) {
        let _ = self.inbound.send(envelope);
    }

    /// Subscribe to every envelope posted from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.inbound.subscribe(),
        }
    }

    /// Subscribe to one message name from one frame.
    ///
    /// Create the listener before triggering the message it waits for.
    pub fn listen(&self, frame_id: FrameId, name: impl Into<String>) -> Listener {
        Listener {
            sub: self.subscribe(),
            frame_id,
            name: name.into(),
        }
    }

    /// Mirror a host-to-frame envelope onto the outbound tap.
    pub(crate) fn record_outbound(&self, envelope: &Envelope) {
        let _ = self.outbound.send(envelope.clone());
    }

    /// Observe envelopes the host sends to frames.
    pub fn traffic(&self) -> Subscription {
        Subscription {
            rx: self.outbound.subscribe(),
        }
    }
}

impl Default for HostChannel {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Unfiltered view of one direction of the channel.
pub struct Subscription {
    rx: broadcast::Receiver<Envelope>,
}

impl Subscription {
    /// Next envelope, or `None` once every sender is gone.
    ///
    /// A lagging subscriber skips what it missed instead of failing.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    crate::debug!("channel"; "subscriber lagged, skipped {} envelopes", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-buffered envelope, without waiting.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => return Some(envelope),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Everything currently buffered.
    pub fn drain(&mut self) -> Vec<Envelope> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

// =============================================================================
// Listener
// =============================================================================

/// A subscription filtered to one frame and one message name.
pub struct Listener {
    sub: Subscription,
    frame_id: FrameId,
    name: String,
}

impl Listener {
    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, envelope: &Envelope) -> bool {
        envelope.name == self.name && envelope.is_for(&self.frame_id)
    }

    /// Payload of the next matching envelope.
    pub async fn next(&mut self) -> Option<Value> {
        while let Some(envelope) = self.sub.recv().await {
            if self.matches(&envelope) {
                return Some(envelope.data);
            }
        }
        None
    }

    /// Payload of the next already-buffered matching envelope.
    pub fn try_next(&mut self) -> Option<Value> {
        while let Some(envelope) = self.sub.try_recv() {
            if self.matches(&envelope) {
                return Some(envelope.data);
            }
        }
        None
    }

    /// Wait for one matching envelope, failing with `LoadTimeout`.
    pub async fn wait(mut self, timeout: Duration) -> Result<Value, PreviewError> {
        let result = tokio::time::timeout(timeout, self.next()).await;
        match result {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(PreviewError::ChannelClosed),
            Err(_) => Err(PreviewError::LoadTimeout {
                frame_id: self.frame_id,
                event: self.name,
                timeout,
            }),
        }
    }
}
