//! HTML serialization helpers.
//!
//! - `escape_text()`, `escape_attr()` - entity escaping for serialization
//! - `is_void_element()` - elements that never have children
//! - `is_raw_text_element()` - elements whose text is emitted verbatim

use std::borrow::Cow;

/// Escape text content. Only `<`, `>` and `&` are significant there.
#[inline]
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, &['<', '>', '&'])
}

/// Escape a double-quoted attribute value.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, &['&', '"'])
}

#[inline]
fn escape_with<'a>(s: &'a str, chars: &[char]) -> Cow<'a, str> {
    if !s.contains(chars) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' if chars.contains(&c) => result.push_str("&lt;"),
            '>' if chars.contains(&c) => result.push_str("&gt;"),
            '&' if chars.contains(&c) => result.push_str("&amp;"),
            '"' if chars.contains(&c) => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Decode character references back to characters.
///
/// Handles the common named entities and numeric references; anything else
/// is left as written.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        result.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        s if s.starts_with("#x") || s.starts_with("#X") => {
            u32::from_str_radix(&s[2..], 16).ok().and_then(char::from_u32)
        }
        s if s.starts_with('#') => s[1..].parse().ok().and_then(char::from_u32),
        _ => None,
    }
}

/// Check if an HTML tag is a void element (no closing tag).
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content is not HTML-escaped).
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Elements that belong in `<head>` when a document omits it.
#[inline]
pub fn is_head_element(tag: &str) -> bool {
    matches!(tag, "base" | "link" | "meta" | "style" | "title")
}
