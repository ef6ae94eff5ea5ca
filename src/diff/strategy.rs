//! Patch strategies.
//!
//! A strategy decides what an already loaded frame receives when the source
//! changes without changing identity. Both strategies report `Unchanged` for
//! identical trees; they differ in what they send otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::patch::{PatchOp, diff};
use super::DocumentSnapshot;
use crate::protocol::HostCommand;

/// What to send to a frame for one source change.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Structural patch against the live tree
    Update(Vec<PatchOp>),
    /// Whole-tree replacement, script context survives
    HtmlUpdate(String),
    /// Nothing to send
    Unchanged,
}

impl Plan {
    pub fn into_command(self) -> Option<HostCommand> {
        match self {
            Self::Update(ops) => Some(HostCommand::Update(ops)),
            Self::HtmlUpdate(html) => Some(HostCommand::HtmlUpdate(html)),
            Self::Unchanged => None,
        }
    }
}

pub trait PatchStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Plan the update from the last delivered tree to the next one.
    fn plan(&self, baseline: &DocumentSnapshot, next: &DocumentSnapshot) -> Plan;
}

/// Send the minimal structural patch.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffPatch;

impl PatchStrategy for DiffPatch {
    fn name(&self) -> &'static str {
        "diff-patch"
    }

    fn plan(&self, baseline: &DocumentSnapshot, next: &DocumentSnapshot) -> Plan {
        let ops = diff(baseline.root(), next.root());
        if ops.is_empty() {
            Plan::Unchanged
        } else {
            Plan::Update(ops)
        }
    }
}

/// Re-send the whole serialized tree on any change.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullReplace;

impl PatchStrategy for FullReplace {
    fn name(&self) -> &'static str {
        "full-replace"
    }

    fn plan(&self, baseline: &DocumentSnapshot, next: &DocumentSnapshot) -> Plan {
        if diff(baseline.root(), next.root()).is_empty() {
            Plan::Unchanged
        } else {
            Plan::HtmlUpdate(next.to_html())
        }
    }
}

/// Configured strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    DiffPatch,
    #[default]
    FullReplace,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn PatchStrategy> {
        match self {
            Self::DiffPatch => Box::new(DiffPatch),
            Self::FullReplace => Box::new(FullReplace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(html: &str) -> DocumentSnapshot {
        DocumentSnapshot::parse(html)
    }

    #[test]
    fn test_unchanged_for_identical_trees() {
        let a = snap("<p>same</p>");
        let b = snap("<p>same</p>");
        assert_eq!(DiffPatch.plan(&a, &b), Plan::Unchanged);
        assert_eq!(FullReplace.plan(&a, &b), Plan::Unchanged);
    }

    #[test]
    fn test_diff_patch_sends_ops() {
        let plan = DiffPatch.plan(&snap("<p>a</p>"), &snap("<p>b</p>"));
        assert!(matches!(plan, Plan::Update(ops) if ops.len() == 1));
    }

    #[test]
    fn test_full_replace_sends_serialized_tree() {
        let next = snap("<p>b</p>");
        let plan = FullReplace.plan(&snap("<p>a</p>"), &next);
        assert_eq!(plan, Plan::HtmlUpdate(next.to_html()));
    }

    #[test]
    fn test_kind_from_config_name() {
        let kind: StrategyKind = serde_json::from_str("\"diff-patch\"").unwrap();
        assert_eq!(kind.build().name(), "diff-patch");
        assert_eq!(StrategyKind::default().build().name(), "full-replace");
    }

    #[test]
    fn test_plan_into_command() {
        assert!(Plan::Unchanged.into_command().is_none());
        assert!(Plan::HtmlUpdate("x".into()).into_command().is_some_and(|c| c.is_patch()));
        assert!(Plan::Update(vec![]).into_command().is_some_and(|c| c.is_patch()));
    }
}
