//! Owned document model.
//!
//! - `node` - `Element`/`Node` tree with child-index paths
//! - `parse` - HTML to tree, normalized to `html > (head, body)`
//! - `html` - escaping and element classification
//! - `locate` - stable element locators for telemetry
//! - `layout` - content extent estimation

pub mod html;
pub mod layout;
pub mod locate;
pub mod node;
pub mod parse;

pub use layout::Viewport;
pub use locate::locator;
pub use node::{Element, Node, NodePath};
pub use parse::{parse_document, parse_fragment};
