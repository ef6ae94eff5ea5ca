//! DOM Differ
//!
//! Computes the minimal update for a frame whose document identity did not
//! change, and applies such updates inside the frame.
//!
//! - `patch` - `PatchOp`, `diff()` and `apply()`
//! - `strategy` - `DiffPatch` and `FullReplace` behind `PatchStrategy`

pub mod patch;
pub mod strategy;

pub use patch::{PatchError, PatchOp, apply, diff};
pub use strategy::{DiffPatch, FullReplace, PatchStrategy, Plan, StrategyKind};

use crate::dom::{Element, parse_document};

/// Parsed tree of one source version.
///
/// Kept by the host as the baseline for the next diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    root: Element,
}

impl DocumentSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            root: parse_document(html),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn to_html(&self) -> String {
        self.root.outer_html()
    }

    pub fn has_script(&self) -> bool {
        self.root.contains_tag("script")
    }
}

impl From<Element> for DocumentSnapshot {
    fn from(root: Element) -> Self {
        Self { root }
    }
}
