//! Patch Operations
//!
//! Structural edits addressed by child-index paths from the root element.
//! Paths in one patch refer to the tree as it is when that operation runs,
//! so the differ emits removals from the highest index down.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::{Element, Node, NodePath};

// =============================================================================
// Patch Operation
// =============================================================================

/// Individual patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Replace the node at `path`
    Replace { path: NodePath, node: Node },

    /// Set the content of the text node at `path`
    Text { path: NodePath, text: String },

    /// Update element attributes (None = remove attribute)
    Attrs {
        path: NodePath,
        attrs: Vec<(String, Option<String>)>,
    },

    /// Insert `node` as child `index` of the element at `path`
    Insert {
        path: NodePath,
        index: usize,
        node: Node,
    },

    /// Remove the node at `path`
    Remove { path: NodePath },
}

impl PatchOp {
    pub fn replace(path: &[usize], node: Node) -> Self {
        Self::Replace {
            path: path.to_vec(),
            node,
        }
    }

    pub fn text(path: &[usize], text: impl Into<String>) -> Self {
        Self::Text {
            path: path.to_vec(),
            text: text.into(),
        }
    }

    pub fn remove(path: &[usize]) -> Self {
        Self::Remove {
            path: path.to_vec(),
        }
    }

    pub fn insert(path: &[usize], index: usize, node: Node) -> Self {
        Self::Insert {
            path: path.to_vec(),
            index,
            node,
        }
    }

    pub fn attrs(path: &[usize], attrs: Vec<(String, Option<String>)>) -> Self {
        Self::Attrs {
            path: path.to_vec(),
            attrs,
        }
    }

    pub fn path(&self) -> &[usize] {
        match self {
            Self::Replace { path, .. }
            | Self::Text { path, .. }
            | Self::Attrs { path, .. }
            | Self::Insert { path, .. }
            | Self::Remove { path } => path,
        }
    }
}

// =============================================================================
// Diff
// =============================================================================

/// Compute the operations that turn `old` into `new`.
///
/// Children are compared by position. Same-tag elements are patched in
/// place, anything else is replaced wholesale.
pub fn diff(old: &Element, new: &Element) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    if old.tag != new.tag {
        ops.push(PatchOp::replace(&[], Node::Element(new.clone())));
    } else {
        diff_element(old, new, &mut Vec::new(), &mut ops);
    }
    ops
}

fn diff_element(old: &Element, new: &Element, path: &mut NodePath, ops: &mut Vec<PatchOp>) {
    let changed = diff_attrs(old, new);
    if !changed.is_empty() {
        ops.push(PatchOp::attrs(path, changed));
    }

    let common = old.children.len().min(new.children.len());
    for i in 0..common {
        path.push(i);
        diff_node(&old.children[i], &new.children[i], path, ops);
        path.pop();
    }

    for i in (common..old.children.len()).rev() {
        path.push(i);
        ops.push(PatchOp::remove(path));
        path.pop();
    }

    for (i, node) in new.children.iter().enumerate().skip(common) {
        ops.push(PatchOp::insert(path, i, node.clone()));
    }
}

fn diff_node(old: &Node, new: &Node, path: &mut NodePath, ops: &mut Vec<PatchOp>) {
    match (old, new) {
        (Node::Element(a), Node::Element(b)) if a.tag == b.tag => diff_element(a, b, path, ops),
        (Node::Text { text: a }, Node::Text { text: b }) => {
            if a != b {
                ops.push(PatchOp::text(path, b.clone()));
            }
        }
        _ if old == new => {}
        _ => ops.push(PatchOp::replace(path, new.clone())),
    }
}

/// Attribute changes, compared by name regardless of order.
fn diff_attrs(old: &Element, new: &Element) -> Vec<(String, Option<String>)> {
    let mut changed: Vec<(String, Option<String>)> = new
        .attrs
        .iter()
        .filter(|(name, value)| old.attr(name) != Some(value.as_str()))
        .map(|(name, value)| (name.clone(), Some(value.clone())))
        .collect();

    changed.extend(
        old.attrs
            .iter()
            .filter(|(name, _)| new.attr(name).is_none())
            .map(|(name, _)| (name.clone(), None)),
    );
    changed
}

// =============================================================================
// Apply
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("no node at path {0:?}")]
    MissingNode(NodePath),

    #[error("node at path {0:?} is not an element")]
    NotAnElement(NodePath),

    #[error("node at path {0:?} is not text")]
    NotText(NodePath),

    #[error("insert index {index} out of range at path {path:?}")]
    IndexOutOfRange { path: NodePath, index: usize },

    #[error("the document root cannot be removed or replaced by a non-element")]
    Root,
}

/// Apply a patch to a tree.
///
/// All-or-nothing: on error the tree is left exactly as it was.
pub fn apply(root: &mut Element, ops: &[PatchOp]) -> Result<(), PatchError> {
    let mut working = root.clone();
    for op in ops {
        apply_op(&mut working, op)?;
    }
    *root = working;
    Ok(())
}

fn apply_op(root: &mut Element, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Replace { path, node } => match path.split_last() {
            None => match node {
                Node::Element(elem) => {
                    *root = elem.clone();
                    Ok(())
                }
                _ => Err(PatchError::Root),
            },
            Some((&index, parent)) => {
                let slot = child_mut(root, parent, index, path)?;
                *slot = node.clone();
                Ok(())
            }
        },
        PatchOp::Text { path, text } => {
            let (&index, parent) = path.split_last().ok_or(PatchError::Root)?;
            match child_mut(root, parent, index, path)? {
                Node::Text { text: current } => {
                    *current = text.clone();
                    Ok(())
                }
                _ => Err(PatchError::NotText(path.clone())),
            }
        }
        PatchOp::Attrs { path, attrs } => {
            let elem = element_mut(root, path)?;
            for (name, value) in attrs {
                match value {
                    Some(value) => elem.set_attr(name.clone(), value.clone()),
                    None => elem.remove_attr(name),
                }
            }
            Ok(())
        }
        PatchOp::Insert { path, index, node } => {
            let elem = element_mut(root, path)?;
            if *index > elem.children.len() {
                return Err(PatchError::IndexOutOfRange {
                    path: path.clone(),
                    index: *index,
                });
            }
            elem.children.insert(*index, node.clone());
            Ok(())
        }
        PatchOp::Remove { path } => {
            let (&index, parent) = path.split_last().ok_or(PatchError::Root)?;
            let elem = element_mut(root, parent)?;
            if index >= elem.children.len() {
                return Err(PatchError::MissingNode(path.clone()));
            }
            elem.children.remove(index);
            Ok(())
        }
    }
}

fn element_mut<'a>(root: &'a mut Element, path: &[usize]) -> Result<&'a mut Element, PatchError> {
    if root.element_at(path).is_none() {
        return Err(match root.node_at(path) {
            Some(_) => PatchError::NotAnElement(path.to_vec()),
            None => PatchError::MissingNode(path.to_vec()),
        });
    }
    root.element_at_mut(path)
        .ok_or_else(|| PatchError::MissingNode(path.to_vec()))
}

fn child_mut<'a>(
    root: &'a mut Element,
    parent: &[usize],
    index: usize,
    path: &[usize],
) -> Result<&'a mut Node, PatchError> {
    element_mut(root, parent)?
        .children
        .get_mut(index)
        .ok_or_else(|| PatchError::MissingNode(path.to_vec()))
}
