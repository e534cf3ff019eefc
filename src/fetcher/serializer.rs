//! HTML serialization with attribute substitutions
//!
//! Rewrites are keyed by element position in document order (pre-order, the
//! same order `descendants()` yields) and applied while writing the markup
//! out, so the parsed tree itself is never mutated. Template contents live
//! under a fragment node below the `<template>` element; they are walked in
//! place so positions stay aligned with `descendants()`.

use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;

/// Attribute replacements per element position
pub(crate) type Rewrites = HashMap<usize, Vec<(&'static str, String)>>;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// HTML elements that never have children or an end tag
const VOID_ELEMENTS: [&str; 18] = [
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// HTML elements whose text content is written verbatim
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
    "script",
    "style",
    "xmp",
];

/// Serializes a document, substituting rewritten attribute values
pub(crate) fn serialize(document: &Html, rewrites: &Rewrites) -> String {
    let mut serializer = Serializer {
        out: String::new(),
        position: 0,
        rewrites,
    };

    for child in document.tree.root().children() {
        serializer.node(ElementRef::wrap(child), child.value(), false);
    }

    serializer.out
}

struct Serializer<'r> {
    out: String,
    position: usize,
    rewrites: &'r Rewrites,
}

impl Serializer<'_> {
    fn node(&mut self, element: Option<ElementRef<'_>>, value: &Node, raw_text: bool) {
        match element {
            Some(element) => self.element(element),
            None => self.leaf(value, raw_text),
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let position = self.position;
        self.position += 1;

        let value = element.value();
        let name = value.name();
        let is_html = &*value.name.ns == HTML_NAMESPACE;
        let overrides = self.rewrites.get(&position);

        self.out.push('<');
        self.out.push_str(name);
        for (attribute, original) in value.attrs.iter() {
            let namespace: &str = &attribute.ns;
            let local: &str = &attribute.local;

            let replaced = overrides
                .filter(|_| namespace.is_empty())
                .and_then(|list| list.iter().find(|(a, _)| *a == local))
                .map(|(_, v)| v.as_str());

            self.out.push(' ');
            match namespace {
                XML_NAMESPACE => self.out.push_str("xml:"),
                XMLNS_NAMESPACE if local != "xmlns" => self.out.push_str("xmlns:"),
                XLINK_NAMESPACE => self.out.push_str("xlink:"),
                _ => {}
            }
            self.out.push_str(local);
            self.out.push_str("=\"");
            escape_attribute(&mut self.out, replaced.unwrap_or(&**original));
            self.out.push('"');
        }
        self.out.push('>');

        if is_html && VOID_ELEMENTS.contains(&name) {
            return;
        }

        let raw_text = is_html && RAW_TEXT_ELEMENTS.contains(&name);
        for child in element.children() {
            if child.value().is_fragment() {
                for inner in child.children() {
                    self.node(ElementRef::wrap(inner), inner.value(), raw_text);
                }
            } else {
                self.node(ElementRef::wrap(child), child.value(), raw_text);
            }
        }

        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn leaf(&mut self, node: &Node, raw_text: bool) {
        match node {
            Node::Text(text) => {
                if raw_text {
                    self.out.push_str(text);
                } else {
                    escape_text(&mut self.out, text);
                }
            }
            Node::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment);
                self.out.push_str("-->");
            }
            Node::Doctype(doctype) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(doctype.name());
                self.out.push('>');
            }
            _ => {}
        }
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
