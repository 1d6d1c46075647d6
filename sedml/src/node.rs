// SPDX-License-Identifier: MIT OR Apache-2.0

//! A generic, mutable XML tree, used to hold content the object model doesn't
//! interpret: notes, annotations, and foreign markup such as MathML.

use log::debug;

use crate::de::XmlInputStream;
use crate::token::{XmlAttributes, XmlNamespaces, XmlToken, XmlTriple};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Element,
    Text,

    /// A nameless container for a sequence of sibling nodes.
    Fragment,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XmlNode {
    kind: NodeKind,
    triple: XmlTriple,
    attributes: XmlAttributes,
    namespaces: XmlNamespaces,
    chars: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new_element(triple: XmlTriple, attributes: XmlAttributes, namespaces: XmlNamespaces) -> Self {
        Self {
            kind: NodeKind::Element,
            triple,
            attributes,
            namespaces,
            chars: String::new(),
            children: Vec::new(),
        }
    }

    /// Shorthand for an element with no attributes or namespace declarations.
    pub fn element(name: &str, uri: &str, prefix: &str) -> Self {
        Self::new_element(
            XmlTriple::new(name, uri, prefix),
            XmlAttributes::new(),
            XmlNamespaces::new(),
        )
    }

    pub fn new_text(chars: &str) -> Self {
        Self {
            kind: NodeKind::Text,
            triple: XmlTriple::default(),
            attributes: XmlAttributes::new(),
            namespaces: XmlNamespaces::new(),
            chars: chars.to_owned(),
            children: Vec::new(),
        }
    }

    pub fn new_fragment() -> Self {
        Self {
            kind: NodeKind::Fragment,
            ..Self::new_text("")
        }
    }

    /// Builds an element node from a start token, or a text node from a text token.
    pub fn from_token(token: &XmlToken) -> Self {
        if token.is_text() {
            Self::new_text(token.characters())
        } else {
            Self::new_element(
                token.triple().clone(),
                token.attributes().clone(),
                token.namespaces().clone(),
            )
        }
    }

    /// Reads the next element or text (including all descendants) from `stream`.
    ///
    /// Whitespace-only text inside elements is dropped.
    pub fn from_stream(stream: &mut XmlInputStream) -> Option<Self> {
        if !stream.is_good() {
            return None;
        }
        let start = stream.next();
        if !start.is_start() && !start.is_text() {
            return None;
        }
        let mut node = Self::from_token(&start);
        if start.is_text() || start.is_end() {
            return Some(node);
        }
        while stream.is_good() {
            let next = stream.peek();
            if next.is_end_for(&start) {
                stream.next();
                break;
            } else if next.is_start() {
                if let Some(child) = Self::from_stream(stream) {
                    node.children.push(child);
                }
            } else if next.is_text() {
                let text = stream.next();
                if !text.is_whitespace() {
                    node.children.push(Self::from_token(&text));
                }
            } else {
                stream.next();
            }
        }
        Some(node)
    }

    /// Parses a string of XML content which may lack a single root.
    ///
    /// `namespaces` are declared on an enclosing element while parsing so that
    /// their prefixes may be used without redeclaring them. A lone child comes
    /// back as-is; several come back inside a fragment. Returns `None` for empty
    /// or malformed input.
    pub fn parse_fragment(xml: &str, namespaces: Option<&XmlNamespaces>) -> Option<Self> {
        let mut wrapped = String::with_capacity(xml.len() + 64);
        wrapped.push_str("<wrapper");
        if let Some(ns) = namespaces {
            for (prefix, uri) in ns.iter() {
                // Leave the default namespace unset so unprefixed content keeps its own.
                if prefix.is_empty() {
                    continue;
                }
                wrapped.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape_attr(uri)));
            }
        }
        wrapped.push('>');
        wrapped.push_str(xml);
        wrapped.push_str("</wrapper>");

        let mut stream = XmlInputStream::from_str(&wrapped);
        let outer = Self::from_stream(&mut stream)?;
        if let Some(e) = stream.take_error() {
            debug!("unable to parse XML fragment: {}", e);
            return None;
        }
        let mut children = outer.children;
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => {
                let mut fragment = Self::new_fragment();
                fragment.children = children;
                Some(fragment)
            }
        }
    }

    /// Serializes this node (and descendants) without an XML declaration.
    pub fn to_xml_string(&self) -> String {
        crate::ser::Serializer::new()
            .fragment(true)
            .to_string(|s| s.write_node(self))
            .unwrap_or_else(|e| {
                debug!("unable to serialize node <{}>: {}", self.triple.prefixed_name(), e);
                String::new()
            })
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn is_fragment(&self) -> bool {
        self.kind == NodeKind::Fragment
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

    pub fn attributes_mut(&mut self) -> &mut XmlAttributes {
        &mut self.attributes
    }

    pub fn namespaces(&self) -> &XmlNamespaces {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut XmlNamespaces {
        &mut self.namespaces
    }

    pub fn characters(&self) -> &str {
        &self.chars
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, i: usize) -> Option<&XmlNode> {
        self.children.get(i)
    }

    pub fn child_mut(&mut self, i: usize) -> Option<&mut XmlNode> {
        self.children.get_mut(i)
    }

    pub fn add_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    pub fn insert_child(&mut self, i: usize, child: XmlNode) {
        let i = i.min(self.children.len());
        self.children.insert(i, child);
    }

    pub fn remove_child(&mut self, i: usize) -> Option<XmlNode> {
        if i < self.children.len() {
            Some(self.children.remove(i))
        } else {
            None
        }
    }

    /// Removes and returns all children.
    pub fn take_children(&mut self) -> Vec<XmlNode> {
        std::mem::take(&mut self.children)
    }

    /// Index of the first element child with local name `name`.
    pub fn index_of_child(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.is_element() && c.name() == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.index_of_child(name).is_some()
    }
}

fn escape_attr(v: &str) -> String {
    v.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
    }

    #[test]
    fn fragment_shapes() {
        init();
        let one = XmlNode::parse_fragment("<p>hi</p>", None).unwrap();
        assert!(one.is_element());
        assert_eq!(one.name(), "p");
        assert_eq!(one.child(0).unwrap().characters(), "hi");

        let two = XmlNode::parse_fragment("<p>a</p>\n<p>b</p>", None).unwrap();
        assert!(two.is_fragment());
        assert_eq!(two.num_children(), 2);

        let text = XmlNode::parse_fragment("just words", None).unwrap();
        assert!(text.is_text());

        assert!(XmlNode::parse_fragment("<p>", None).is_none());
        assert!(XmlNode::parse_fragment("", None).is_none());
    }

    #[test]
    fn fragment_uses_supplied_prefixes() {
        init();
        let mut ns = XmlNamespaces::new();
        ns.add("http://example.com/x", "x");
        ns.add("http://example.com/default", "");
        let n = XmlNode::parse_fragment("<x:a><b/></x:a>", Some(&ns)).unwrap();
        assert_eq!(n.uri(), "http://example.com/x");
        assert!(n.namespaces().is_empty());
        assert_eq!(n.child(0).unwrap().uri(), "");
    }

    #[test]
    fn serialize() {
        init();
        let n = XmlNode::parse_fragment(
            r#"<notes><p xmlns="http://www.w3.org/1999/xhtml" class="c">a &amp; b</p></notes>"#,
            None,
        )
        .unwrap();
        assert_eq!(
            n.to_xml_string(),
            r#"<notes><p xmlns="http://www.w3.org/1999/xhtml" class="c">a &amp; b</p></notes>"#
        );
        let again = XmlNode::parse_fragment(&n.to_xml_string(), None).unwrap();
        assert_eq!(again, n);
    }

    #[test]
    fn child_edits() {
        let mut n = XmlNode::element("annotation", "", "");
        n.add_child(XmlNode::element("a", "", ""));
        n.add_child(XmlNode::element("b", "", ""));
        n.insert_child(0, XmlNode::new_text("t"));
        assert_eq!(n.index_of_child("b"), Some(2));
        assert!(n.remove_child(1).is_some());
        assert!(!n.has_child("a"));
        assert!(n.remove_child(9).is_none());
        assert_eq!(n.take_children().len(), 2);
        assert_eq!(n.num_children(), 0);
    }
}
