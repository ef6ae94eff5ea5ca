//! Boxcutter - live HTML previews inside isolated frames.
//!
//! A host renders untrusted or frequently changing HTML in a preview frame
//! and keeps it synchronized through a private message protocol. The frame
//! reports live telemetry (size, scroll, pointer) and exposes a remote
//! procedure call channel into its script context.
//!
//! # Architecture
//!
//! ```text
//!  Preview (host API)
//!     |  set_source(id, html)
//!     v
//!  PreviewActor --SyncEngine--> FrameLifecycle --HostCommand--> FrameRuntime
//!     ^                                                             |
//!     +---------------- HostChannel <----FrameEvent-----------------+
//! ```
//!
//! # Modules
//!
//! - `protocol` - Envelope wire shape, typed messages, host channel
//! - `dom` - Owned document tree, HTML parsing and serialization
//! - `diff` - Tree diffing and the two patch strategies
//! - `runtime` - Code that runs inside a frame
//! - `frame` - Frame handles, container and the seamless swap
//! - `sync` - The source synchronization state machine
//! - `preview` - Host-facing API and telemetry state

pub mod logger;

pub mod config;
pub mod diff;
pub mod dom;
pub mod error;
pub mod frame;
pub mod preview;
pub mod protocol;
pub mod runtime;
pub mod source;
pub mod sync;

pub use config::PreviewConfig;
pub use error::PreviewError;
pub use preview::{Preview, PreviewEvent, PreviewState};
pub use protocol::{FrameId, HostChannel};
pub use runtime::{FrameScope, NoScripts, ScriptEngine, ScriptStatus, scripts};
pub use source::{Mode, RenderMode, Source};
