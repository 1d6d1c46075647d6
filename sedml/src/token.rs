// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types describing pieces of an XML document: names, attributes,
//! namespace declarations, and the tokens produced by [`crate::de::XmlInputStream`].

use std::fmt;

/// A name with its namespace URI and the prefix used to spell it.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct XmlTriple {
    pub name: String,
    pub uri: String,
    pub prefix: String,
}

impl XmlTriple {
    pub fn new(name: &str, uri: &str, prefix: &str) -> Self {
        Self {
            name: name.to_owned(),
            uri: uri.to_owned(),
            prefix: prefix.to_owned(),
        }
    }

    /// Returns `prefix:name`, or just `name` when unprefixed.
    pub fn prefixed_name(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.prefix, self.name)
        }
    }

    pub(crate) fn from_xml_name(name: &xml::name::OwnedName) -> Self {
        Self {
            name: name.local_name.clone(),
            uri: match (&name.namespace, &name.prefix) {
                (Some(ns), _) => ns.clone(),
                // xml-rs doesn't map the builtin `xml` prefix.
                (None, Some(p)) if p == "xml" => crate::XML_NS.to_owned(),
                (None, _) => String::new(),
            },
            prefix: name.prefix.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for XmlTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            write!(f, "{}", self.prefixed_name())
        } else {
            write!(f, "{{{}}}{}", self.uri, self.name)
        }
    }
}

/// An ordered list of attributes, as they appeared on a start tag.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct XmlAttributes(Vec<(XmlTriple, String)>);

impl XmlAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unprefixed, unnamespaced attribute, replacing any existing one of the same name.
    pub fn add(&mut self, name: &str, value: &str) {
        self.add_triple(XmlTriple::new(name, "", ""), value);
    }

    pub fn add_triple(&mut self, triple: XmlTriple, value: &str) {
        match self
            .0
            .iter_mut()
            .find(|(t, _)| t.name == triple.name && t.uri == triple.uri)
        {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.0.push((triple, value.to_owned())),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&XmlTriple, &str)> {
        self.0.iter().map(|(t, v)| (t, v.as_str()))
    }

    /// Returns the value of the unprefixed attribute `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| t.name == name && t.prefix.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn value_ns(&self, name: &str, uri: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| t.name == name && t.uri == uri)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let i = self.0.iter().position(|(t, _)| t.name == name)?;
        Some(self.0.remove(i).1)
    }
}

/// Namespace declarations made on a single element, in declaration order.
///
/// An empty prefix denotes the default namespace.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct XmlNamespaces(Vec<(String, String)>);

impl XmlNamespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `prefix` to map to `uri`, replacing an existing declaration of `prefix`.
    pub fn add(&mut self, uri: &str, prefix: &str) {
        match self.0.iter_mut().find(|(p, _)| p == prefix) {
            Some(entry) => entry.1 = uri.to_owned(),
            None => self.0.push((prefix.to_owned(), uri.to_owned())),
        }
    }

    pub fn remove(&mut self, prefix: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|(p, _)| p != prefix);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(prefix, uri)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn index_of_prefix(&self, prefix: &str) -> Option<usize> {
        self.0.iter().position(|(p, _)| p == prefix)
    }

    pub fn uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    pub fn prefix_for_uri(&self, uri: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    pub fn has_uri(&self, uri: &str) -> bool {
        self.0.iter().any(|(_, u)| u == uri)
    }

    pub fn uri(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(|(_, u)| u.as_str())
    }

    pub fn prefix(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(|(p, _)| p.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TokenKind {
    Element { start: bool, end: bool },
    Text,
    Eof,
}

/// A single item read from an [`crate::de::XmlInputStream`].
///
/// A start tag immediately followed by its end tag is reported as one token
/// that is both a start and an end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XmlToken {
    kind: TokenKind,
    triple: XmlTriple,
    attributes: XmlAttributes,
    namespaces: XmlNamespaces,
    chars: String,
    line: u32,
    column: u32,
}

impl XmlToken {
    pub fn start(
        triple: XmlTriple,
        attributes: XmlAttributes,
        namespaces: XmlNamespaces,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            kind: TokenKind::Element {
                start: true,
                end: false,
            },
            triple,
            attributes,
            namespaces,
            chars: String::new(),
            line,
            column,
        }
    }

    pub fn end(triple: XmlTriple, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Element {
                start: false,
                end: true,
            },
            triple,
            attributes: XmlAttributes::default(),
            namespaces: XmlNamespaces::default(),
            chars: String::new(),
            line,
            column,
        }
    }

    pub fn text(chars: String, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Text,
            triple: XmlTriple::default(),
            attributes: XmlAttributes::default(),
            namespaces: XmlNamespaces::default(),
            chars,
            line,
            column,
        }
    }

    pub fn eof() -> Self {
        Self {
            kind: TokenKind::Eof,
            triple: XmlTriple::default(),
            attributes: XmlAttributes::default(),
            namespaces: XmlNamespaces::default(),
            chars: String::new(),
            line: 0,
            column: 0,
        }
    }

    /// Marks a start token as also being its own end.
    pub(crate) fn set_end(&mut self) {
        if let TokenKind::Element { ref mut end, .. } = self.kind {
            *end = true;
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, TokenKind::Element { start: true, .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, TokenKind::Element { end: true, .. })
    }

    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// True if this is a pure end tag closing `element`.
    pub fn is_end_for(&self, element: &XmlToken) -> bool {
        self.kind
            == TokenKind::Element {
                start: false,
                end: true,
            }
            && self.triple.name == element.triple.name
            && self.triple.uri == element.triple.uri
    }

    pub fn is_whitespace(&self) -> bool {
        self.is_text() && self.chars.trim().is_empty()
    }

    pub fn name(&self) -> &str {
        &self.triple.name
    }

    pub fn prefix(&self) -> &str {
        &self.triple.prefix
    }

    pub fn uri(&self) -> &str {
        &self.triple.uri
    }

    pub fn triple(&self) -> &XmlTriple {
        &self.triple
    }

    pub fn attributes(&self) -> &XmlAttributes {
        &self.attributes
    }

    pub fn namespaces(&self) -> &XmlNamespaces {
        &self.namespaces
    }

    pub fn characters(&self) -> &str {
        &self.chars
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_replace_by_prefix() {
        let mut ns = XmlNamespaces::new();
        ns.add("http://example.com/a", "");
        ns.add("http://example.com/b", "b");
        ns.add("http://example.com/c", "");
        assert_eq!(ns.len(), 2);
        assert_eq!(ns.uri_for_prefix(""), Some("http://example.com/c"));
        assert_eq!(ns.prefix_for_uri("http://example.com/b"), Some("b"));
        assert_eq!(ns.index_of_prefix("b"), Some(1));
        assert!(ns.remove("b"));
        assert!(!ns.has_uri("http://example.com/b"));
    }

    #[test]
    fn end_for_requires_pure_end() {
        let start = XmlToken::start(
            XmlTriple::new("a", "u", ""),
            XmlAttributes::new(),
            XmlNamespaces::new(),
            1,
            1,
        );
        let end = XmlToken::end(XmlTriple::new("a", "u", ""), 1, 4);
        let mut both = start.clone();
        both.set_end();
        assert!(end.is_end_for(&start));
        assert!(!both.is_end_for(&start));
        assert!(both.is_start() && both.is_end());
        assert!(!XmlToken::end(XmlTriple::new("a", "other", ""), 1, 1).is_end_for(&start));
    }

    #[test]
    fn unprefixed_attribute_lookup() {
        let mut attrs = XmlAttributes::new();
        attrs.add_triple(XmlTriple::new("type", "http://x", "xsi"), "t");
        attrs.add("id", "m1");
        assert_eq!(attrs.value("id"), Some("m1"));
        assert_eq!(attrs.value("type"), None);
        assert_eq!(attrs.value_ns("type", "http://x"), Some("t"));
    }
}
