//! Message Envelope Protocol
//!
//! Every cross-boundary communication is a single JSON envelope:
//!
//! ```text
//! { "frameId": "frame-…", "name": "write", "data": …, "runId": "run-7" }
//! ```
//!
//! `frameId` scopes a message to one preview so that several previews on the
//! same host never cross-talk. `runId` is only present on RPC traffic.
//!
//! # Modules
//!
//! - `envelope` - Wire shape and identifiers
//! - `message` - Typed host commands and frame events
//! - `remote_error` - Serializable error representation
//! - `channel` - The ordered host message channel

pub mod channel;
pub mod envelope;
pub mod message;
pub mod remote_error;

pub use channel::{HostChannel, Listener, Subscription};
pub use envelope::{Envelope, FrameId, RunId};
pub use message::{DocumentSize, FrameEvent, HostCommand, PointerData, ScrollPosition};
pub use remote_error::RemoteError;

use thiserror::Error;

/// Reserved message names.
pub mod names {
    pub const WRITE: &str = "write";
    pub const UPDATE: &str = "update";
    pub const HTML_UPDATE: &str = "html-update";
    pub const SCROLL: &str = "scroll";
    pub const SET_FRAME_ID: &str = "setFrameId";
    pub const DOM_CONTENT_LOADED: &str = "DOMContentLoaded";
    pub const LOAD: &str = "load";
    pub const RESIZE: &str = "resize";
    pub const MOUSE_MOVE: &str = "mousemove";
    pub const MOUSE_ENTER: &str = "mouseenter";
    pub const MOUSE_LEAVE: &str = "mouseleave";
    pub const CLICK: &str = "click";
    pub const RESOLVE: &str = "resolve";
    pub const REJECT: &str = "reject";
    pub const PATCH_FAILED: &str = "patchFailed";

    /// Prefix of RPC request names (`fn:<function>`).
    pub const FN_PREFIX: &str = "fn:";

    /// Check whether a name belongs to the protocol rather than to user events.
    pub fn is_reserved(name: &str) -> bool {
        name.starts_with(FN_PREFIX)
            || matches!(
                name,
                WRITE
                    | UPDATE
                    | HTML_UPDATE
                    | SCROLL
                    | SET_FRAME_ID
                    | DOM_CONTENT_LOADED
                    | LOAD
                    | RESIZE
                    | MOUSE_MOVE
                    | MOUSE_ENTER
                    | MOUSE_LEAVE
                    | CLICK
                    | RESOLVE
                    | REJECT
                    | PATCH_FAILED
            )
    }
}

/// Malformed or unroutable protocol traffic.
///
/// These never surface to users: receivers drop the message and move on,
/// since a missing listener is the normal fate of messages to stale frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope")]
    Json(#[from] serde_json::Error),

    #[error("malformed `{name}` payload")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{0}` requires a run id")]
    MissingRunId(String),
}
