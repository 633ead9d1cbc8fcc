//! Serialize document nodes back to HTML or XML text.

use std::fmt::Write as _;

use super::arena::{Document, NodeData, NodeId};
use super::builder::VOID_ELEMENTS;
use crate::codec::{escape_attr, escape_text};

/// Serialize a node and its descendants as HTML.
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_html(doc, id, &mut out);
    out
}

/// Serialize the children of a node as HTML.
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_html(doc, child, &mut out);
    }
    out
}

fn write_html(doc: &Document, id: NodeId, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_html(doc, child, out);
            }
        }
        NodeData::Element { name, attrs } => {
            write_start(out, name, attrs);
            out.push('>');
            if VOID_ELEMENTS.contains(&name.as_str()) {
                return;
            }
            for child in doc.children(id) {
                write_html(doc, child, out);
            }
            let _ = write!(out, "</{name}>");
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        NodeData::Doctype(text) => {
            let _ = write!(out, "<!DOCTYPE {text}>");
        }
    }
}

fn write_start(out: &mut String, name: &str, attrs: &[(String, String)]) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        let _ = write!(out, " {key}=\"{}\"", escape_attr(value));
    }
}

/// Serialize an element as an indented XML document body.
///
/// Elements holding only elements are broken over lines; elements with text
/// are written on one line.
pub fn to_xml(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_xml(doc, id, 0, &mut out);
    out
}

fn write_xml(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    match &node.data {
        NodeData::Document => {
            for child in doc.element_children(id) {
                write_xml(doc, child, depth, out);
            }
        }
        NodeData::Element { name, attrs } => {
            out.push_str(&indent);
            write_start(out, name, attrs);
            let children: Vec<_> = doc
                .children(id)
                .filter(|&child| !doc.is_blank_text(child))
                .collect();
            if children.is_empty() {
                out.push_str("/>\n");
            } else if children.iter().all(|&child| doc.is_element(child)) {
                out.push_str(">\n");
                for child in children {
                    write_xml(doc, child, depth + 1, out);
                }
                let _ = writeln!(out, "{indent}</{name}>");
            } else {
                out.push('>');
                for child in doc.children(id) {
                    write_inline_xml(doc, child, out);
                }
                let _ = writeln!(out, "</{name}>");
            }
        }
        _ => write_inline_xml(doc, id, out),
    }
}

fn write_inline_xml(doc: &Document, id: NodeId, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Element { name, attrs } => {
            write_start(out, name, attrs);
            if doc.children(id).next().is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in doc.children(id) {
                write_inline_xml(doc, child, out);
            }
            let _ = write!(out, "</{name}>");
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        NodeData::Document | NodeData::Doctype(_) => {}
    }
}
