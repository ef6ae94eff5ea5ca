//! The live document inside a frame.

use crate::dom::{Element, Node, Viewport, layout, locator, parse_document};
use crate::protocol::{DocumentSize, ScrollPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Complete,
}

pub struct Document {
    root: Element,
    ready_state: ReadyState,
    scroll: ScrollPosition,
    viewport: Viewport,
}

impl Document {
    /// The empty boot document a frame starts with.
    pub fn blank(viewport: Viewport) -> Self {
        Self {
            root: parse_document(""),
            ready_state: ReadyState::Complete,
            scroll: ScrollPosition::ORIGIN,
            viewport,
        }
    }

    /// `document.open()` + `document.write(html)`: parse a new tree.
    ///
    /// The document stays `loading` until [`Document::close`].
    pub fn write(&mut self, html: &str) {
        self.root = parse_document(html);
        self.ready_state = ReadyState::Loading;
        self.scroll = ScrollPosition::ORIGIN;
    }

    /// `document.close()`. A suspended load never becomes interactive.
    pub fn close(&mut self, suspended: bool) {
        if !suspended {
            self.ready_state = ReadyState::Complete;
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn is_ready(&self) -> bool {
        self.ready_state == ReadyState::Complete
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Swap in a new tree, keeping scroll and readiness.
    pub fn replace_tree(&mut self, root: Element) {
        self.root = root;
        self.scroll = self.clamp(self.scroll);
    }

    /// Script bodies in document order. External scripts are skipped.
    pub fn scripts(&self) -> Vec<String> {
        let mut sources = Vec::new();
        self.root.walk(&mut |elem| {
            if elem.tag == "script" && elem.attr("src").is_none() {
                sources.push(elem.text_content());
            }
        });
        sources
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.scroll = self.clamp(self.scroll);
    }

    pub fn size(&self) -> DocumentSize {
        let body = self.body();
        let (scroll_width, scroll_height) = layout::measure(body, self.viewport);
        DocumentSize {
            height: self.viewport.height,
            width: self.viewport.width,
            scroll_height,
            scroll_width,
            is_resizing: false,
        }
    }

    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    /// Scroll, clamped to the scrollable range. Returns the new offset.
    pub fn scroll_to(&mut self, position: ScrollPosition) -> ScrollPosition {
        self.scroll = self.clamp(position);
        self.scroll
    }

    pub fn locate(&self, path: &[usize]) -> Option<String> {
        locator(&self.root, path)
    }

    fn body(&self) -> &Element {
        self.root
            .children
            .iter()
            .filter_map(Node::as_element)
            .find(|e| e.tag == "body")
            .unwrap_or(&self.root)
    }

    fn clamp(&self, position: ScrollPosition) -> ScrollPosition {
        let size = self.size();
        let max_top = (size.scroll_height - size.height).max(0.0);
        let max_left = (size.scroll_width - size.width).max(0.0);
        ScrollPosition {
            scroll_top: position.scroll_top.clamp(0.0, max_top),
            scroll_left: position.scroll_left.clamp(0.0, max_left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TALL: &str = r#"<div style="height: 2000px">tall</div>"#;

    #[test]
    fn test_blank_document_is_complete() {
        let doc = Document::blank(Viewport::default());
        assert!(doc.is_ready());
        assert!(doc.scripts().is_empty());
    }

    #[test]
    fn test_write_then_close() {
        let mut doc = Document::blank(Viewport::default());
        doc.write("<p>x</p>");
        assert_eq!(doc.ready_state(), ReadyState::Loading);
        doc.close(false);
        assert_eq!(doc.ready_state(), ReadyState::Complete);
    }

    #[test]
    fn test_suspended_close_stays_loading() {
        let mut doc = Document::blank(Viewport::default());
        doc.write("<p>x</p>");
        doc.close(true);
        assert!(!doc.is_ready());
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut doc = Document::blank(Viewport::default());
        doc.write(TALL);
        assert_eq!(
            doc.scroll_to(ScrollPosition::new(5000.0, 30.0)),
            ScrollPosition::new(1400.0, 0.0)
        );
        assert_eq!(
            doc.scroll_to(ScrollPosition::new(-10.0, 0.0)),
            ScrollPosition::ORIGIN
        );
    }

    #[test]
    fn test_short_document_cannot_scroll() {
        let mut doc = Document::blank(Viewport::default());
        doc.write("<p>short</p>");
        assert_eq!(
            doc.scroll_to(ScrollPosition::new(100.0, 0.0)),
            ScrollPosition::ORIGIN
        );
    }

    #[test]
    fn test_scripts_in_order_without_external() {
        let mut doc = Document::blank(Viewport::default());
        doc.write(r#"<script>first</script><p>x</p><script src="a.js"></script><script>second</script>"#);
        assert_eq!(doc.scripts(), ["first", "second"]);
    }

    #[test]
    fn test_size_reports_viewport_and_extent() {
        let mut doc = Document::blank(Viewport::default());
        doc.write(TALL);
        doc.set_viewport(Viewport::new(400.0, 300.0));
        let size = doc.size();
        assert_eq!(size.height, 300.0);
        assert_eq!(size.width, 400.0);
        assert_eq!(size.scroll_height, 2000.0);
        assert!(!size.is_resizing);
    }
}
