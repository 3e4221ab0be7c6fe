//! Minimal mutable XML tree for solution files.
//!
//! Parsing is event driven via `quick_xml`; the tree keeps elements,
//! attribute order, text, comments, CDATA and processing instructions
//! inside the root. Anything outside the root element (declaration, prolog
//! comments, doctype) is dropped, and output never carries an XML
//! declaration.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message} (at byte {position})")]
pub struct XmlError {
    pub position: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Direct child elements named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter_map(move |node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Index into `children` of the first direct child element matching
    /// `pred`.
    pub fn position_of(&self, pred: impl Fn(&Element) -> bool) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if pred(el)))
    }

    fn has_markup_children(&self) -> bool {
        self.children.iter().any(|n| !matches!(n, Node::Text(_)))
    }

    /// Normalize whitespace so every nested element sits on its own line,
    /// indented two spaces per level. Text that is not pure whitespace is
    /// left alone.
    pub fn indent(&mut self, level: usize) {
        if !self.has_markup_children() {
            return;
        }
        let pad = |l: usize| format!("\n{}", "  ".repeat(l));

        let mut leading = String::new();
        let mut items: Vec<(Node, String)> = Vec::new();
        for node in self.children.drain(..) {
            match node {
                Node::Text(text) => match items.last_mut() {
                    Some((_, tail)) => tail.push_str(&text),
                    None => leading.push_str(&text),
                },
                mut item => {
                    if let Node::Element(el) = &mut item {
                        el.indent(level + 1);
                    }
                    items.push((item, String::new()));
                }
            }
        }

        if leading.trim().is_empty() {
            leading = pad(level + 1);
        }
        let last = items.len() - 1;
        for (i, (_, tail)) in items.iter_mut().enumerate() {
            if tail.trim().is_empty() {
                *tail = if i == last { pad(level) } else { pad(level + 1) };
            }
        }

        self.children.push(Node::Text(leading));
        for (item, tail) in items {
            self.children.push(item);
            self.children.push(Node::Text(tail));
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {key}=\"{}\"", escape(value.as_str()));
        }
        if self.children.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(el) => el.write_to(out),
                Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Node::Comment(text) => {
                    let _ = write!(out, "<!--{text}-->");
                }
                Node::CData(text) => {
                    let _ = write!(out, "<![CDATA[{text}]]>");
                }
                Node::ProcessingInstruction(text) => {
                    let _ = write!(out, "<?{text}?>");
                }
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

// ---------------------------------------------------------------------------
// Parse / render
// ---------------------------------------------------------------------------

fn element_from(start: &BytesStart<'_>, position: u64) -> Result<Element, XmlError> {
    let err = |message: String| XmlError { position, message };
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| err(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| err(e.to_string()))?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
    position: u64,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(el));
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError {
            position,
            message: "multiple root elements".into(),
        });
    }
    *root = Some(el);
    Ok(())
}

/// Parse a document and return its root element.
pub fn parse(input: &str) -> Result<Element, XmlError> {
    let input = input.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event();
        let position = reader.buffer_position() as u64;
        let fail = |message: String| XmlError { position, message };

        match event.map_err(|e| fail(e.to_string()))? {
            Event::Start(start) => stack.push(element_from(&start, position)?),
            Event::Empty(start) => {
                let el = element_from(&start, position)?;
                attach(&mut stack, &mut root, el, position)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| fail("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, el, position)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| fail(e.to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => return Err(fail("text outside the root element".into())),
                }
            }
            Event::Comment(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Comment(String::from_utf8_lossy(&text).into_owned()));
                }
            }
            Event::CData(text) => match stack.last_mut() {
                Some(parent) => parent
                    .children
                    .push(Node::CData(String::from_utf8_lossy(&text).into_owned())),
                None => return Err(fail("CDATA outside the root element".into())),
            },
            Event::PI(pi) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::ProcessingInstruction(
                        String::from_utf8_lossy(&pi).into_owned(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError {
            position: input.len() as u64,
            message: format!("unclosed element <{}>", open.name),
        });
    }
    root.ok_or_else(|| XmlError {
        position: 0,
        message: "no root element found".into(),
    })
}

/// Indent `root` in place and serialize it without an XML declaration.
/// A root with child elements is followed by a newline.
pub fn render(root: &mut Element) -> String {
    root.indent(0);
    let mut out = String::new();
    root.write_to(&mut out);
    if root.has_markup_children() {
        out.push('\n');
    }
    out
}
