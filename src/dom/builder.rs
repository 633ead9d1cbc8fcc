//! Build a [`Document`] from `quick-xml` events.
//!
//! Two modes share one event loop. HTML mode is lenient: names are
//! lowercased, void elements never take children, unquoted and valueless
//! attributes are accepted, a few elements close implicitly, and unmatched
//! end tags are ignored. XML mode keeps names as written.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::arena::{Document, NodeId};
use crate::codec::{resolve_entity, unescape_html};
use crate::error::{Error, Result};
use crate::format::Format;

/// Elements that never have content.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Html,
    Xml,
}

/// Parse an HTML document or fragment.
pub fn parse_html(src: &str) -> Result<Document> {
    build(src, Mode::Html)
}

/// Parse an XML document.
pub fn parse_xml(src: &str) -> Result<Document> {
    build(src, Mode::Xml)
}

fn build(src: &str, mode: Mode) -> Result<Document> {
    let format = match mode {
        Mode::Html => Format::Html,
        Mode::Xml => Format::Olx,
    };
    let mut reader = Reader::from_str(src);
    {
        let config = reader.config_mut();
        config.trim_text(false);
        if mode == Mode::Html {
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.allow_dangling_amp = true;
        }
    }

    let mut doc = Document::new();
    // Open elements with their names; the document root is the bottom.
    let mut stack: Vec<(NodeId, String)> = vec![(doc.root(), String::new())];

    loop {
        let event = reader.read_event().map_err(|e| Error::xml(format, e))?;
        let parent = stack.last().map(|(id, _)| *id).unwrap_or(doc.root());
        match event {
            Event::Start(e) => {
                let (name, attrs) = element_parts(&e, mode).map_err(|e| Error::xml(format, e))?;
                if mode == Mode::Html {
                    close_implicitly(&mut stack, &name);
                }
                let parent = stack.last().map(|(id, _)| *id).unwrap_or(doc.root());
                let id = doc.append_element(parent, name.clone(), attrs);
                if mode == Mode::Xml || !VOID_ELEMENTS.contains(&name.as_str()) {
                    stack.push((id, name));
                }
            }
            Event::Empty(e) => {
                let (name, attrs) = element_parts(&e, mode).map_err(|e| Error::xml(format, e))?;
                if mode == Mode::Html {
                    close_implicitly(&mut stack, &name);
                }
                let parent = stack.last().map(|(id, _)| *id).unwrap_or(doc.root());
                doc.append_element(parent, name, attrs);
            }
            Event::End(e) => {
                let name = tag_name(e.name().as_ref(), mode);
                match stack.iter().rposition(|(_, open)| *open == name) {
                    Some(pos) if pos > 0 => stack.truncate(pos),
                    _ if mode == Mode::Html => {}
                    _ => {
                        return Err(Error::format(
                            format,
                            format!("unexpected closing tag </{name}>"),
                        ));
                    }
                }
            }
            Event::Text(e) => {
                let raw = String::from_utf8_lossy(e.as_ref());
                doc.append_text(parent, &unescape_html(&raw));
            }
            Event::CData(e) => {
                doc.append_text(parent, &String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => doc.append_text(parent, &resolved),
                    None => doc.append_text(parent, &format!("&{entity};")),
                }
            }
            Event::Comment(e) => {
                let comment = doc.create_comment(String::from_utf8_lossy(e.as_ref()));
                doc.append(parent, comment);
            }
            Event::DocType(e) => {
                let doctype = doc.create_doctype(String::from_utf8_lossy(e.as_ref()).trim());
                doc.append(parent, doctype);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if mode == Mode::Xml && stack.len() > 1 {
        let (_, open) = &stack[stack.len() - 1];
        return Err(Error::format(format, format!("unclosed element <{open}>")));
    }

    Ok(doc)
}

fn tag_name(raw: &[u8], mode: Mode) -> String {
    let name = String::from_utf8_lossy(raw);
    match mode {
        Mode::Html => name.to_ascii_lowercase(),
        Mode::Xml => name.into_owned(),
    }
}

type Parts = (String, Vec<(String, String)>);

fn element_parts(e: &BytesStart<'_>, mode: Mode) -> std::result::Result<Parts, quick_xml::Error> {
    let name = tag_name(e.name().as_ref(), mode);
    let mut attributes = match mode {
        Mode::Html => e.html_attributes(),
        Mode::Xml => e.attributes(),
    };
    attributes.with_checks(false);

    let mut attrs = Vec::new();
    for attr in attributes {
        let attr = attr?;
        let key = tag_name(attr.key.as_ref(), mode);
        let value = String::from_utf8_lossy(&attr.value);
        attrs.push((key, unescape_html(&value).into_owned()));
    }
    Ok((name, attrs))
}

/// Close elements that HTML ends implicitly when `name` opens.
fn close_implicitly(stack: &mut Vec<(NodeId, String)>, name: &str) {
    const BLOCKS: &[&str] = &[
        "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
        "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p",
        "pre", "section", "table", "ul",
    ];
    let Some((_, open)) = stack.last() else {
        return;
    };
    let closes = match open.as_str() {
        "p" => BLOCKS.contains(&name),
        "li" => name == "li",
        "option" => name == "option",
        "dt" | "dd" => matches!(name, "dt" | "dd"),
        "td" | "th" => matches!(name, "td" | "th" | "tr"),
        "tr" => name == "tr",
        _ => false,
    };
    if closes && stack.len() > 1 {
        stack.pop();
    }
}
