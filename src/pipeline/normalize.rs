//! Content normalization — transport decoding and markup stripping.
//!
//! Providers hand us message bodies as base64-encoded HTML. `normalize`
//! turns one into plain text in two steps:
//! 1. `decode_body` — base64 decode; any failure yields empty text
//! 2. `strip_html` — extract text nodes, excluding `<style>` subtrees
//!
//! Both steps are pure and message-local: one malformed body must never
//! abort the batch it arrived in.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use scraper::{Html, Node};

/// Decode a base64 transport-encoded body into text.
///
/// Returns the empty string on any decode failure. Non-UTF-8 payloads are
/// decoded lossily rather than rejected.
pub fn decode_body(encoded: &str) -> String {
    match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

/// Extract the text content of an HTML document.
///
/// Pre-order walk concatenating text nodes in document order; `<style>`
/// subtrees contribute nothing. html5ever is error-tolerant, so a mangled
/// document degrades to whatever text survives parsing instead of failing.
pub fn strip_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();

    let mut stack: Vec<_> = vec![doc.tree.root()];
    while let Some(node) = stack.pop() {
        match node.value() {
            // Skipping the element here keeps its whole subtree out.
            Node::Element(el) if el.name() == "style" => continue,
            Node::Text(text) => out.push_str(text),
            _ => {}
        }
        // Reverse so the explicit stack pops children in document order.
        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }

    out
}

/// Decode and strip a raw encoded body into plain text.
pub fn normalize(encoded_body: &str) -> String {
    strip_html(&decode_body(encoded_body))
}
