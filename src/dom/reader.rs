//! Lenient markup reader
//!
//! Builds a Document from an XML-ish string. Character data is merged
//! into the `text`/`tail` fields of the surrounding nodes; comments become
//! Comment nodes; the five predefined entities and numeric character
//! references are decoded. Lenient mode never fails: mismatched or stray
//! tags are absorbed, not reported. Validation is out of scope here - the
//! addressing engine only needs a tree snapshot to index.

use memchr::memchr;

use super::document::Document;
use super::node::{Node, NodeId};

/// Parse a markup string into a Document (lenient)
pub(crate) fn parse(input: &str) -> Document {
    let bytes = input.as_bytes();
    let mut doc = Document::empty();
    let mut stack: Vec<NodeId> = vec![0];
    let mut pos = 0;

    while pos < bytes.len() {
        let lt = match memchr(b'<', &bytes[pos..]) {
            Some(i) => pos + i,
            None => bytes.len(),
        };
        if lt > pos {
            attach_text(&mut doc, &stack, &input[pos..lt]);
        }
        if lt >= bytes.len() {
            break;
        }

        let rest = &bytes[lt..];
        if rest.starts_with(b"<!--") {
            // Comment: content up to -->
            match input[lt + 4..].find("-->") {
                Some(i) => {
                    let content = &input[lt + 4..lt + 4 + i];
                    let parent = *stack.last().unwrap_or(&0);
                    let depth = stack.len() as u16;
                    let tag_id = doc.strings.intern(content);
                    doc.push_node(Node::comment(tag_id, Some(parent), depth));
                    pos = lt + 4 + i + 3;
                }
                None => break, // unterminated comment: drop the rest
            }
        } else if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
            // Doctype / declaration / PI: skip to the closing '>'
            pos = match memchr(b'>', &bytes[lt..]) {
                Some(i) => lt + i + 1,
                None => bytes.len(),
            };
        } else if rest.starts_with(b"</") {
            // Close tag: pop one frame, ignoring name mismatches
            if stack.len() > 1 {
                stack.pop();
            }
            pos = match memchr(b'>', &bytes[lt..]) {
                Some(i) => lt + i + 1,
                None => bytes.len(),
            };
        } else {
            pos = read_element(&mut doc, &mut stack, input, lt);
        }
    }

    doc
}

/// Read an open (or self-closing) tag starting at `lt`; returns the
/// position just past the closing '>'
fn read_element(doc: &mut Document, stack: &mut Vec<NodeId>, input: &str, lt: usize) -> usize {
    let bytes = input.as_bytes();
    let gt = match memchr(b'>', &bytes[lt..]) {
        Some(i) => lt + i,
        None => bytes.len(),
    };
    // Tag body without the angle brackets; trailing '/' marks self-closing
    let mut body = &input[lt + 1..gt.min(input.len())];
    let self_closing = body.ends_with('/');
    if self_closing {
        body = &body[..body.len() - 1];
    }

    let name_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() {
        // Stray '<': treat the bracketed run as discarded markup
        return gt.saturating_add(1);
    }

    let parent = *stack.last().unwrap_or(&0);
    let depth = stack.len() as u16;
    let tag_id = doc.strings.intern(name);
    let mut node = Node::element(tag_id, Some(parent), depth);

    if let Some(class_value) = attribute_value(&body[name_end..], "class") {
        let decoded = decode_entities(&class_value);
        node.class_ids = decoded
            .split_whitespace()
            .map(|token| doc.strings.intern(token))
            .collect();
    }

    let id = doc.push_node(node);
    if !self_closing {
        stack.push(id);
    }
    gt.saturating_add(1)
}

/// Extract one attribute value from a tag body (lenient scan)
fn attribute_value(attrs: &str, wanted: &str) -> Option<String> {
    let mut rest = attrs;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();
        if !rest.starts_with('=') {
            // Bare attribute without a value
            continue;
        }
        rest = rest[1..].trim_start();
        let value;
        if let Some(quote) = rest.chars().next().filter(|&c| c == '"' || c == '\'') {
            let close = rest[1..].find(quote).map(|i| i + 1).unwrap_or(rest.len());
            value = &rest[1..close];
            rest = rest.get(close + 1..).unwrap_or("");
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace())
                .unwrap_or(rest.len());
            value = &rest[..end];
            rest = &rest[end..];
        }
        if name == wanted {
            return Some(value.to_string());
        }
    }
}

/// Attach character data to the current content stream: the tail of the
/// last sibling if one exists, otherwise the open element's text.
/// Document-level text has no owner and is dropped.
fn attach_text(doc: &mut Document, stack: &[NodeId], raw: &str) {
    let top = *stack.last().unwrap_or(&0);
    if top == 0 {
        return;
    }
    let decoded = decode_entities(raw);
    let target = doc.get_node(top).and_then(|n| n.last_child);
    match target {
        Some(child) => {
            let node = doc.node_mut(child);
            match &mut node.tail {
                Some(t) => t.push_str(&decoded),
                None => node.tail = Some(decoded),
            }
        }
        None => {
            let node = doc.node_mut(top);
            match &mut node.text {
                Some(t) => t.push_str(&decoded),
                None => node.text = Some(decoded),
            }
        }
    }
}

/// Decode the predefined entities and numeric character references
fn decode_entities(s: &str) -> String {
    if memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        // Entity names are short; a distant ';' means a literal ampersand
        let semi = rest[..rest.len().min(12)].find(';');
        let decoded = semi.and_then(|j| decode_entity(&rest[1..j]).map(|c| (c, j)));
        match decoded {
            Some((c, j)) => {
                out.push(c);
                rest = &rest[j + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
            if let Some(hex) = code {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;x&gt;"), "<x>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("bare & done"), "bare & done");
    }

    #[test]
    fn test_class_attribute() {
        let doc = Document::parse(r#"<p class="ltx_math big">x</p>"#);
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.classes(root), vec!["ltx_math", "big"]);
    }

    #[test]
    fn test_comment_tail() {
        let doc = Document::parse("<p>a<!--note-->b</p>");
        let root = doc.root_element_id().unwrap();
        let comment = doc.children(root).next().unwrap();
        assert!(doc.get_node(comment).unwrap().is_comment());
        assert_eq!(doc.text(root), Some("a"));
        assert_eq!(doc.tail(comment), Some("b"));
    }

    #[test]
    fn test_self_closing_and_tail() {
        let doc = Document::parse("<a><b/>xyz</a>");
        let root = doc.root_element_id().unwrap();
        let b = doc.children(root).next().unwrap();
        assert_eq!(doc.tag(b), Some("b"));
        assert_eq!(doc.text(root), None);
        assert_eq!(doc.tail(b), Some("xyz"));
    }

    #[test]
    fn test_lenient_mismatch() {
        // Stray close tags are absorbed without panicking
        let doc = Document::parse("<a><b>x</c></a></zzz>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.tag(root), Some("a"));
    }

    #[test]
    fn test_doctype_and_pi_skipped() {
        let doc = Document::parse("<?xml version=\"1.0\"?><!DOCTYPE html><a>x</a>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.tag(root), Some("a"));
        assert_eq!(doc.text(root), Some("x"));
    }
}
