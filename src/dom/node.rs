//! Owned document tree.

use serde::{Deserialize, Serialize};

use super::html::{escape_attr, escape_text, is_raw_text_element, is_void_element};

/// Path from the root `<html>` element to a node, as child indices.
///
/// The empty path addresses the root itself.
pub type NodePath = Vec<usize>;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text { text: String },
    Comment { text: String },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, false);
        out
    }

    fn write_html(&self, out: &mut String, raw: bool) {
        match self {
            Self::Element(elem) => elem.write_html(out),
            Self::Text { text } if raw => out.push_str(text),
            Self::Text { text } => out.push_str(&escape_text(text)),
            Self::Comment { text } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Self::Element(elem)
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::text(text))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    /// Element children, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| e.tag == tag)
    }

    /// Depth-first search for an element with the given tag.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.child_elements()
            .any(|e| e.tag == tag || e.contains_tag(tag))
    }

    /// Visit every descendant element in document order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        for child in self.child_elements() {
            f(child);
            child.walk(f);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(elem) => elem.collect_text(out),
                Node::Text { text } => out.push_str(text),
                Node::Comment { .. } => {}
            }
        }
    }

    /// Node at a child-index path.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        self.element_at(parents)?.children.get(*last)
    }

    /// Element at a child-index path; the empty path is `self`.
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |elem, &i| elem.children.get(i)?.as_element())
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut elem = self;
        for &i in path {
            elem = elem.children.get_mut(i)?.as_element_mut()?;
        }
        Some(elem)
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_children(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        out.push('>');

        if is_void_element(&self.tag) {
            return;
        }

        self.write_children(out);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    fn write_children(&self, out: &mut String) {
        let raw = is_raw_text_element(&self.tag);
        for child in &self.children {
            child.write_html(out, raw);
        }
    }
}
