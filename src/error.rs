//! Errors surfaced through the host API.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::protocol::{FrameId, RemoteError};

#[derive(Debug, Error)]
pub enum PreviewError {
    /// A frame never reported a lifecycle event in time.
    #[error("frame `{frame_id}` did not report `{event}` within {timeout:?}")]
    LoadTimeout {
        frame_id: FrameId,
        event: String,
        timeout: Duration,
    },

    #[error("remote call `{function}` got no reply within {timeout:?}")]
    CallTimeout { function: String, timeout: Duration },

    /// The frame rejected an RPC call.
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("host channel closed")]
    ChannelClosed,

    #[error("preview has shut down")]
    Shutdown,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PreviewError {
    /// The remote error, when the failure came from inside the frame.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}
