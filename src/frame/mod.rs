//! Frame Lifecycle Manager
//!
//! - `handle` - `FrameHandle`, one booted frame and its runtime
//! - `container` - the ordered frames of one preview
//! - `lifecycle` - mount, write and the seamless swap

pub mod container;
pub mod handle;
pub mod lifecycle;


pub use container::FrameContainer;
pub use handle::{FrameAttrs, FrameHandle, FrameStyle, InstanceId};
pub use lifecycle::{ActiveFrame, FrameLifecycle};
