//! Stable element locators for pointer telemetry.
//!
//! An element with an `id` is located as `#id`. Anything else gets a
//! structural path from the root, one `TAG:nth-child(n)` step per level,
//! where `n` counts only element siblings and starts at 1:
//!
//! ```text
//! HTML>BODY:nth-child(2)>DIV:nth-child(1)>SPAN:nth-child(3)
//! ```

use super::node::{Element, Node};

/// Locator for the element at `path`.
///
/// Paths that end on a text or comment node resolve to the parent element,
/// which is what pointer events target.
pub fn locator(root: &Element, path: &[usize]) -> Option<String> {
    let mut chain: Vec<(&Element, usize)> = Vec::with_capacity(path.len());
    let mut current = root;

    for &index in path {
        match current.children.get(index)? {
            Node::Element(child) => {
                let position = current.children[..index]
                    .iter()
                    .filter(|n| n.is_element())
                    .count()
                    + 1;
                chain.push((child, position));
                current = child;
            }
            _ => break,
        }
    }

    if let Some(id) = current.id() {
        return Some(format!("#{id}"));
    }

    let mut parts = vec![root.tag.to_uppercase()];
    parts.extend(
        chain
            .iter()
            .map(|(elem, position)| format!("{}:nth-child({position})", elem.tag.to_uppercase())),
    );
    Some(parts.join(">"))
}
