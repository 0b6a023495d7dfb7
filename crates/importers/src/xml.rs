//! Minimal owned element tree built from the quick-xml event stream.
//!
//! The importer needs "first match at any depth" queries, which are awkward
//! on a streaming reader, so the document is materialized once. Building the
//! tree doubles as the well-formedness check: any reader error, unbalanced
//! tag, stray text or second root rejects the whole document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ImportError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text content of this element (children excluded).
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every element below this one, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
            boundary: None,
        }
    }

    /// Like [`descendants`](Self::descendants), but elements named
    /// `boundary` are yielded without their subtrees.
    pub fn descendants_within<'a>(&'a self, boundary: &'a str) -> Descendants<'a> {
        Descendants {
            stack: self.children.iter().rev().collect(),
            boundary: Some(boundary),
        }
    }

    /// This element followed by its descendants.
    pub fn descendants_or_self(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(self).chain(self.descendants())
    }

    /// Elements matching a slash-separated path relative to this element.
    ///
    /// `a/b` walks children; an empty step (`//`) makes the next step match
    /// at any depth, so `.//file/pathurl` finds a `pathurl` child of any
    /// `file` below this element.
    pub fn select(&self, path: &str) -> Vec<&Element> {
        self.select_steps(path, None)
    }

    /// [`select`](Self::select) that never looks inside a descendant named
    /// `boundary`.
    pub fn select_within<'a>(&'a self, path: &str, boundary: &'a str) -> Vec<&'a Element> {
        self.select_steps(path, Some(boundary))
    }

    fn select_steps<'a>(&'a self, path: &str, boundary: Option<&'a str>) -> Vec<&'a Element> {
        let path = path.strip_prefix('.').unwrap_or(path);
        let mut current = vec![self];
        let mut any_depth = false;
        for step in path.split('/') {
            if step.is_empty() {
                any_depth = true;
                continue;
            }
            let mut next = Vec::new();
            for el in &current {
                if any_depth {
                    let below = match boundary {
                        Some(name) => el.descendants_within(name),
                        None => el.descendants(),
                    };
                    next.extend(below.filter(|d| d.name == step));
                } else {
                    next.extend(el.children.iter().filter(|c| c.name == step));
                }
            }
            current = next;
            any_depth = false;
        }
        current
    }

    pub fn find(&self, path: &str) -> Option<&Element> {
        self.select(path).into_iter().next()
    }

    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).map(Element::text)
    }

    pub fn find_within<'a>(&'a self, path: &str, boundary: &'a str) -> Option<&'a Element> {
        self.select_within(path, boundary).into_iter().next()
    }

    pub fn find_text_within<'a>(&'a self, path: &str, boundary: &'a str) -> Option<&'a str> {
        self.find_within(path, boundary).map(Element::text)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
    boundary: Option<&'a str>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        if self.boundary != Some(el.name.as_str()) {
            self.stack.extend(el.children.iter().rev());
        }
        Some(el)
    }
}

fn malformed(position: u64, reason: impl Into<String>) -> ImportError {
    ImportError::MalformedDocument {
        position,
        reason: reason.into(),
    }
}

fn open_element(start: &BytesStart<'_>, position: u64) -> Result<Element, ImportError> {
    let mut el = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(position, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(position, e.to_string()))?
            .into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

/// Parse a complete document into its root element.
pub fn parse_tree(xml: &str) -> Result<Element, ImportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| malformed(position, e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed(position, "content after the root element"));
                }
                stack.push(open_element(e, position)?);
            }
            Event::Empty(ref e) => {
                let el = open_element(e, position)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(el),
                    None if root.is_none() => root = Some(el),
                    None => return Err(malformed(position, "content after the root element")),
                }
            }
            Event::End(_) => {
                let Some(el) = stack.pop() else {
                    return Err(malformed(position, "closing tag without an open element"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(el),
                    None => root = Some(el),
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape().map_err(|e| malformed(position, e.to_string()))?;
                match stack.last_mut() {
                    Some(el) => el.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed(position, "text outside the root element")),
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                match stack.last_mut() {
                    Some(el) => el.text.push_str(&text),
                    None => return Err(malformed(position, "CDATA outside the root element")),
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            reader.buffer_position() as u64,
            format!("unclosed element <{}>", open.name),
        ));
    }
    root.ok_or_else(|| malformed(0, "document has no root element"))
}
