//! Read-only XML document tree.
//!
//! A verified response body is parsed once into an [`Element`] tree. Values
//! are read through path accessors that fail explicitly: a missing node is
//! [`ApiError::MissingField`], an unparseable one is [`ApiError::InvalidField`].
//!
//! Paths are `/`-separated child names resolved from the element they are
//! called on; the first child with a matching name wins. A final segment of
//! the form `@name` addresses an attribute instead of a child.
//!
//! ```
//! use allopass_kit::document::Document;
//!
//! let doc = Document::parse(
//!     br#"<response code="0"><website id="1"><name>Demo</name></website></response>"#,
//! )?;
//! let root = doc.root();
//!
//! assert_eq!(root.get_int("@code")?, 0);
//! assert_eq!(root.get_int("website/@id")?, 1);
//! assert_eq!(root.get_string("website/name")?, "Demo");
//! assert!(root.find("website/url").is_none());
//! # Ok::<(), allopass_kit::error::ApiError>(())
//! ```

use std::collections::BTreeMap;

use quick_xml::{Reader, events::Event};
use serde::Serialize;

use crate::error::{ApiError, Result};

/// XML element with its attributes, text and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

fn split_attribute(path: &str) -> (&str, Option<&str>) {
    match path.rsplit_once('/') {
        Some((head, tail)) => match tail.strip_prefix('@') {
            Some(attribute) => (head, Some(attribute)),
            None => (path, None),
        },
        None => match path.strip_prefix('@') {
            Some(attribute) => ("", Some(attribute)),
            None => (path, None),
        },
    }
}

impl Element {
    /// Tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content, trimmed.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All attributes.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Direct children in document order.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Direct children named `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Resolves an element path. The empty path is `self`.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .try_fold(self, |node, segment| node.children.iter().find(|c| c.name == segment))
    }

    /// Resolves a path to its raw value: attribute value for `@name`
    /// segments, element text otherwise.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<&str> {
        let (element_path, attribute) = split_attribute(path);
        let node = self.find(element_path)?;
        match attribute {
            Some(name) => node.attribute(name),
            None => Some(node.text()),
        }
    }

    fn full_path(&self, path: &str) -> String {
        if path.is_empty() { self.name.clone() } else { format!("{}/{path}", self.name) }
    }

    fn invalid(&self, path: &str, value: &str) -> ApiError {
        ApiError::InvalidField { path: self.full_path(path), value: value.to_owned() }
    }

    /// Required element.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if no element matches `path`.
    pub fn get_element(&self, path: &str) -> Result<&Element> {
        self.find(path).ok_or_else(|| ApiError::MissingField(self.full_path(path)))
    }

    /// Required string value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if the node or attribute is absent.
    pub fn get_string(&self, path: &str) -> Result<&str> {
        self.value(path).ok_or_else(|| ApiError::MissingField(self.full_path(path)))
    }

    /// Required integer value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent, [`ApiError::InvalidField`]
    /// if not a decimal integer.
    pub fn get_int(&self, path: &str) -> Result<i64> {
        let raw = self.get_string(path)?;
        raw.trim().parse().map_err(|_| self.invalid(path, raw))
    }

    /// Required floating point value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent, [`ApiError::InvalidField`]
    /// if not a number.
    pub fn get_float(&self, path: &str) -> Result<f64> {
        let raw = self.get_string(path)?;
        raw.trim().parse().map_err(|_| self.invalid(path, raw))
    }

    /// Required boolean value (`true`/`false`, `1`/`0`, `yes`/`no`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent, [`ApiError::InvalidField`]
    /// otherwise unparseable.
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        let raw = self.get_string(path)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(self.invalid(path, raw)),
        }
    }

    /// Children of the element at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if no element matches `path`.
    pub fn get_children(&self, path: &str) -> Result<&[Element]> {
        self.get_element(path).map(Element::children)
    }

    /// Optional string value. Absent nodes yield `None`.
    #[must_use]
    pub fn opt_string(&self, path: &str) -> Option<&str> {
        self.value(path)
    }

    /// Optional integer value. Absent or empty nodes yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if present but not an integer.
    pub fn opt_int(&self, path: &str) -> Result<Option<i64>> {
        match self.value(path).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| self.invalid(path, raw)),
        }
    }

    /// Optional float value. Absent or empty nodes yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if present but not a number.
    pub fn opt_float(&self, path: &str) -> Result<Option<f64>> {
        match self.value(path).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| self.invalid(path, raw)),
        }
    }
}

/// Parsed response document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    root: Element,
}

fn malformed(detail: impl std::fmt::Display) -> ApiError {
    ApiError::WrongFormatResponse(detail.to_string())
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| malformed(format!("invalid UTF-8: {e}")))
}

fn open_element(start: &quick_xml::events::BytesStart<'_>) -> Result<Element> {
    let mut element = Element { name: utf8(start.name().as_ref())?, ..Element::default() };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(malformed)?;
        let key = utf8(attribute.key.as_ref())?;
        let value = attribute.unescape_value().map_err(malformed)?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

impl Document {
    /// Parses a well-formed XML document with exactly one root element.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongFormatResponse`] on syntax errors, a missing
    /// or repeated root, unclosed elements, or text outside the root.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed(format!("at byte {}: {e}", reader.buffer_position())))?;
            match event {
                Event::Start(start) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(malformed("more than one root element"));
                    }
                    stack.push(open_element(&start)?);
                }
                Event::Empty(start) => {
                    let element = open_element(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None if root.is_none() => root = Some(element),
                        None => return Err(malformed("more than one root element")),
                    }
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        return Err(malformed("unexpected closing tag"));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(malformed)?;
                    match stack.last_mut() {
                        Some(current) => current.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(malformed("text outside the root element")),
                    }
                }
                Event::CData(data) => match stack.last_mut() {
                    Some(current) => current.text.push_str(&utf8(&data)?),
                    None => return Err(malformed("CDATA outside the root element")),
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("unclosed element <{}>", open.name)));
        }
        let root = root.ok_or_else(|| malformed("document has no root element"))?;
        Ok(Self { root })
    }

    /// Root element.
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// Consumes the document, returning its root.
    #[must_use]
    pub fn into_root(self) -> Element {
        self.root
    }
}
