//! Content size estimation.
//!
//! There is no rendering engine behind a frame, so scrollable extent is
//! estimated from the tree: every text run wraps at the viewport width
//! using a fixed glyph advance, block elements start new lines, and an
//! explicit `height`/`width` in an inline `style` is honoured.

use super::node::{Element, Node};

pub const LINE_HEIGHT: f64 = 18.0;
pub const CHAR_WIDTH: f64 = 8.0;

/// Visible area of a frame, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Estimated content extent `(scroll_width, scroll_height)`.
///
/// Never smaller than the viewport itself.
pub fn measure(body: &Element, viewport: Viewport) -> (f64, f64) {
    let mut extent = Extent::default();
    extent.element(body, viewport.width);
    (
        extent.width.max(viewport.width),
        extent.height.max(viewport.height),
    )
}

#[derive(Default)]
struct Extent {
    width: f64,
    height: f64,
}

impl Extent {
    fn element(&mut self, elem: &Element, available: f64) {
        if matches!(elem.tag.as_str(), "script" | "style" | "head" | "template") {
            return;
        }

        let style = elem.attr("style").unwrap_or_default();
        if let Some(width) = style_px(style, "width") {
            self.width = self.width.max(width);
        }
        if let Some(height) = style_px(style, "height") {
            self.height += height;
            return;
        }

        if matches!(elem.tag.as_str(), "br" | "hr" | "img") {
            self.height += LINE_HEIGHT;
        }

        for child in &elem.children {
            match child {
                Node::Element(child) => self.element(child, available),
                Node::Text { text } => self.text(text, available),
                Node::Comment { .. } => {}
            }
        }
    }

    fn text(&mut self, text: &str, available: f64) {
        let chars = text.trim().chars().count() as f64;
        if chars == 0.0 {
            return;
        }

        let longest_word = text
            .split_whitespace()
            .map(|w| w.chars().count())
            .max()
            .unwrap_or_default() as f64;
        self.width = self.width.max(longest_word * CHAR_WIDTH);

        let per_line = (available / CHAR_WIDTH).floor().max(1.0);
        self.height += (chars / per_line).ceil() * LINE_HEIGHT;
    }
}

/// Pixel value of one property in an inline style, e.g. `height: 2000px`.
fn style_px(style: &str, property: &str) -> Option<f64> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim() != property {
            return None;
        }
        value.trim().strip_suffix("px")?.trim().parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_fills_viewport() {
        let body = Element::new("body");
        assert_eq!(measure(&body, Viewport::default()), (800.0, 600.0));
    }

    #[test]
    fn test_explicit_height() {
        let body = Element::new("body")
            .with_child(Element::new("div").with_attr("style", "color: red; height: 2000px"));
        let (_, height) = measure(&body, Viewport::default());
        assert_eq!(height, 2000.0);
    }

    #[test]
    fn test_text_wraps_at_viewport_width() {
        // 100 chars per line at 800px
        let body = Element::new("body").with_text("x ".repeat(150));
        let (_, height) = measure(&body, Viewport::new(800.0, 10.0));
        assert_eq!(height, 3.0 * LINE_HEIGHT);
    }

    #[test]
    fn test_long_word_widens_content() {
        let body = Element::new("body").with_text("a".repeat(200));
        let (width, _) = measure(&body, Viewport::default());
        assert_eq!(width, 200.0 * CHAR_WIDTH);
    }

    #[test]
    fn test_style_px() {
        assert_eq!(style_px("height:12px", "height"), Some(12.0));
        assert_eq!(style_px("line-height: 3px", "height"), None);
        assert_eq!(style_px("height: auto", "height"), None);
    }
}
