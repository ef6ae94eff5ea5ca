//! HTML parsing into the owned tree.
//!
//! Uses `tl` for tokenizing, then normalizes the result the way a browser
//! would present it: a single `<html>` root holding `<head>` and `<body>`.

use super::html::{is_head_element, is_raw_text_element, unescape};
use super::node::{Element, Node};

/// Parse a full document.
///
/// Missing `<html>`, `<head>` or `<body>` wrappers are synthesized, and the
/// doctype is dropped. Whitespace-only text between tags is not kept.
pub fn parse_document(html: &str) -> Element {
    normalize(parse_nodes(strip_doctype(html)))
}

fn strip_doctype(html: &str) -> &str {
    let trimmed = html.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!doctype"));
    match trimmed.find('>') {
        Some(end) if is_doctype => &trimmed[end + 1..],
        _ => html,
    }
}

/// Parse a fragment into top-level nodes without normalizing.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    parse_nodes(html)
}

fn parse_nodes(html: &str) -> Vec<Node> {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        // Unparseable input still renders, as text
        return vec![Node::text(html)];
    };

    let parser = dom.parser();
    dom.children()
        .iter()
        .filter_map(|handle| convert(*handle, parser, false))
        .collect()
}

fn convert(handle: tl::NodeHandle, parser: &tl::Parser, raw_text: bool) -> Option<Node> {
    let node = handle.get(parser)?;

    match node {
        tl::Node::Tag(tag) => {
            let tag_name = tag.name().as_utf8_str().to_lowercase();
            if tag_name.starts_with('!') {
                return None;
            }

            let mut elem = Element::new(tag_name);
            for (key, value) in tag.attributes().iter() {
                let key_str: &str = key.as_ref();
                let value_str = value.map(|v| unescape(&v).into_owned()).unwrap_or_default();
                if elem.attr(key_str).is_none() {
                    elem.attrs.push((key_str.to_ascii_lowercase(), value_str));
                }
            }
            // Attribute storage order inside tl is not source order
            elem.attrs.sort_by(|a, b| a.0.cmp(&b.0));

            let raw = is_raw_text_element(&elem.tag);
            for child_handle in tag.children().top().iter() {
                if let Some(child) = convert(*child_handle, parser, raw) {
                    elem.children.push(child);
                }
            }

            Some(Node::Element(elem))
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if text.trim().is_empty() {
                None
            } else if raw_text {
                Some(Node::text(text.into_owned()))
            } else {
                Some(Node::text(unescape(&text).into_owned()))
            }
        }
        tl::Node::Comment(bytes) => {
            let text = bytes.as_utf8_str();
            let inner = text
                .strip_prefix("<!--")
                .and_then(|t| t.strip_suffix("-->"))
                .unwrap_or(&text);
            Some(Node::comment(inner.to_string()))
        }
    }
}

/// Give the top-level nodes the `html > (head, body)` shape.
fn normalize(nodes: Vec<Node>) -> Element {
    let mut root = Element::new("html");
    let mut loose = Vec::new();

    for node in nodes {
        match node {
            Node::Element(elem) if elem.tag == "html" && root.children.is_empty() => {
                root.attrs = elem.attrs;
                loose.extend(elem.children);
            }
            other => loose.push(other),
        }
    }

    let mut head: Option<Element> = None;
    let mut body: Option<Element> = None;
    let mut stray_head = Vec::new();
    let mut stray_body = Vec::new();

    for node in loose {
        match node {
            Node::Element(elem) if elem.tag == "head" && head.is_none() => head = Some(elem),
            Node::Element(elem) if elem.tag == "body" && body.is_none() => body = Some(elem),
            Node::Element(elem)
                if body.is_none() && stray_body.is_empty() && is_head_element(&elem.tag) =>
            {
                stray_head.push(Node::Element(elem));
            }
            Node::Comment { .. } if body.is_none() && stray_body.is_empty() => {
                stray_head.push(node);
            }
            other => stray_body.push(other),
        }
    }

    let mut head = head.unwrap_or_else(|| Element::new("head"));
    head.children.extend(stray_head);

    let mut body = body.unwrap_or_else(|| Element::new("body"));
    body.children.extend(stray_body);

    root.children = vec![Node::Element(head), Node::Element(body)];
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document() {
        let doc = parse_document(
            "<!DOCTYPE html><html lang=\"en\"><head><title>T</title></head><body><p>Hi</p></body></html>",
        );
        assert_eq!(doc.tag, "html");
        assert_eq!(doc.attr("lang"), Some("en"));
        assert_eq!(doc.child("head").map(|h| h.text_content()), Some("T".into()));
        assert_eq!(doc.child("body").map(|b| b.inner_html()), Some("<p>Hi</p>".into()));
    }

    #[test]
    fn test_bare_fragment_gets_wrappers() {
        let doc = parse_document("<p>one</p><p>two</p>");
        assert_eq!(
            doc.outer_html(),
            "<html><head></head><body><p>one</p><p>two</p></body></html>"
        );
    }

    #[test]
    fn test_head_elements_before_content_go_to_head() {
        let doc = parse_document("<title>X</title><p>body</p>");
        assert_eq!(doc.child("head").map(|h| h.inner_html()), Some("<title>X</title>".into()));
        assert_eq!(doc.child("body").map(|b| b.inner_html()), Some("<p>body</p>".into()));
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_document("");
        assert_eq!(doc.outer_html(), "<html><head></head><body></body></html>");
    }

    #[test]
    fn test_entities_are_decoded_once() {
        let doc = parse_document("<p>a &amp; b</p>");
        let body = doc.child("body").unwrap();
        assert_eq!(body.text_content(), "a & b");
        assert_eq!(body.inner_html(), "<p>a &amp; b</p>");
    }

    #[test]
    fn test_script_is_detected() {
        let doc = parse_document("<body><script>run()</script></body>");
        assert!(doc.contains_tag("script"));
        assert!(!parse_document("<p>static</p>").contains_tag("script"));
    }

    #[test]
    fn test_fragment_keeps_top_level_nodes() {
        let nodes = parse_fragment("<li>a</li><li>b</li>");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(Node::is_element));
    }
}
