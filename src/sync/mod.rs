//! Sync Decision Engine
//!
//! Decides how a new source reaches the live frame:
//!
//! ```text
//!            navigation / first source / mode change
//!   Idle ─────────────────────────────────────────────> Loading
//!    │  same id, new html                                  │ complete
//!    v                                                     v
//! Patching ──debounce──> patch / html-update / swap     replay rerun
//! ```
//!
//! Only same-id edits are debounced. Sources arriving while a load is in
//! flight collapse into a single latest-wins rerun.

mod debouncer;
mod engine;


pub use debouncer::Debouncer;
pub use engine::{Action, SyncEngine, SyncState};
