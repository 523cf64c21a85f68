//! Lenient HTML-subset parser.
//!
//! Accepts the markup dialect component templates are written in: tags,
//! quoted/unquoted attributes, text, comments, void and self-closing
//! elements. The parser never fails; malformed input degrades instead:
//!
//! - an unmatched closing tag is dropped
//! - tags left open at end of input are closed there
//! - a stray `<` that does not start a tag is kept as text

use crate::Element;
use tracing::trace;

/// Parses markup into an element tree.
///
/// The returned root is a fragment so multi-root templates round-trip.
#[must_use]
pub fn parse(markup: &str) -> Element {
    let root = Element::fragment();
    let mut stack: Vec<Element> = vec![root.clone()];
    let bytes = markup.as_bytes();
    let mut i = 0;
    let mut text_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        // Comment.
        if markup[i..].starts_with("<!--") {
            flush_text(&stack, &markup[text_start..i]);
            i = match markup[i + 4..].find("-->") {
                Some(end) => i + 4 + end + 3,
                None => bytes.len(),
            };
            text_start = i;
            continue;
        }
        // Closing tag.
        if markup[i..].starts_with("</") {
            flush_text(&stack, &markup[text_start..i]);
            let rest = &markup[i + 2..];
            let end = rest.find('>').unwrap_or(rest.len());
            let name = rest[..end].trim().to_ascii_lowercase();
            close_tag(&mut stack, &name);
            i += 2 + end + 1.min(rest.len() - end);
            text_start = i;
            continue;
        }
        // Opening tag, if a name follows. Otherwise keep the '<' as text.
        let Some((element, self_closed, consumed)) = parse_open_tag(&markup[i..]) else {
            i += 1;
            continue;
        };
        flush_text(&stack, &markup[text_start..i]);
        let tag = element.tag();
        if let Some(top) = stack.last() {
            top.append(&element);
        }
        if !self_closed && !is_void(&tag) {
            stack.push(element);
        }
        i += consumed;
        text_start = i;
    }
    flush_text(&stack, &markup[text_start..]);
    if stack.len() > 1 {
        trace!(open = stack.len() - 1, "unclosed tags at end of input");
    }
    root
}

fn is_void(tag: &str) -> bool {
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
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn flush_text(stack: &[Element], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last() {
        top.append_text(text);
    }
}

fn close_tag(stack: &mut Vec<Element>, name: &str) {
    // The fragment root at index 0 is never popped.
    let Some(depth) = stack[1..].iter().rposition(|e| e.tag() == name) else {
        trace!(%name, "unmatched closing tag dropped");
        return;
    };
    stack.truncate(depth + 1);
}

/// Parses one `<tag attr="v" ...>` starting at the `<`. Returns the
/// element, whether it was self-closed, and the bytes consumed.
fn parse_open_tag(input: &str) -> Option<(Element, bool, usize)> {
    let bytes = input.as_bytes();
    debug_assert_eq!(bytes[0], b'<');
    let mut i = 1;
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let element = Element::new(input[name_start..i].to_ascii_lowercase());

    let mut self_closed = false;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                self_closed = true;
                i += 1;
            }
            _ => {
                let (name, value, consumed) = parse_attr(&input[i..]);
                i += consumed;
                if name == "class" {
                    element.add_class(&value);
                } else {
                    element.set_attr(name, value);
                }
            }
        }
    }
    Some((element, self_closed, i))
}

/// Parses one attribute. Returns (name, value, bytes consumed).
fn parse_attr(input: &str) -> (String, String, usize) {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len()
        && !bytes[i].is_ascii_whitespace()
        && !matches!(bytes[i], b'=' | b'>' | b'/')
    {
        i += 1;
    }
    let name = input[..i].to_ascii_lowercase();
    if i >= bytes.len() || bytes[i] != b'=' {
        return (name, String::new(), i.max(1));
    }
    i += 1;
    if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
        let quote = bytes[i];
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        let value = input[value_start..i].to_string();
        if i < bytes.len() {
            i += 1;
        }
        return (name, value, i);
    }
    let value_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'>' | b'/') {
        i += 1;
    }
    (name, input[value_start..i].to_string(), i)
}
