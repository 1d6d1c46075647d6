// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token stream over an XML document, used when reading SED-ML.

use std::sync::Arc;

use log::{debug, trace};
use xml::{
    common::{Position, TextPosition},
    reader::XmlEvent,
};

use crate::token::{XmlAttributes, XmlNamespaces, XmlToken, XmlTriple};

/// A single element in the XML stack; see [`Error::stack`].
#[derive(Clone, Debug)]
pub struct StackElement {
    /// The full name of the element, including its namespace and prefix (if any) and local name.
    pub name: XmlTriple,

    /// The position of this element's start tag within the underlying document.
    pub pos: TextPosition,
}

/// A low-level XML error which ended reading, such as malformed markup.
///
/// The SED-ML reader never returns this directly; it is converted into
/// [`crate::SedErrorLog`] entries. It's available via
/// [`XmlInputStream::take_error`] for callers driving the stream themselves.
///
/// Cloning an `Error` is cheap.
#[derive(Clone, Debug)]
pub struct Error(Arc<ErrorInner>);

impl Error {
    /// Returns the stack of XML elements as of when this error occurred.
    ///
    /// `stack()[0]` is the root; `stack.last()` is the current element.
    pub fn stack(&self) -> &[StackElement] {
        &self.0.stack
    }

    pub fn position(&self) -> TextPosition {
        self.0.pos
    }

    /// Classifies the failure.
    pub fn class(&self) -> ErrorClass {
        match self.0.kind.kind() {
            xml::reader::ErrorKind::Io(_) => ErrorClass::Io,
            xml::reader::ErrorKind::Utf8(_) => ErrorClass::Encoding,
            _ => {
                let msg = self.0.kind.to_string().to_ascii_lowercase();
                if msg.contains("<?xml") || msg.contains("declaration") {
                    ErrorClass::MisplacedDeclaration
                } else {
                    ErrorClass::Malformed
                }
            }
        }
    }

    fn xml(stack: &[StackElement], e: xml::reader::Error) -> Self {
        let pos = e.position();
        Error(Arc::new(ErrorInner {
            kind: e,
            stack: stack.to_vec(),
            pos,
        }))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = &*self.0;
        write!(f, "{} @ {}", &inner.kind, &inner.pos)?;
        if !inner.stack.is_empty() {
            write!(f, "\n\nXML element stack:\n")?;
            for (i, element) in inner.stack.iter().enumerate().rev() {
                writeln!(f, "{:4x}: <{}> @ {}", i, element.name.prefixed_name(), &element.pos)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.0.kind.kind() {
            xml::reader::ErrorKind::Io(io) => Some(io),
            xml::reader::ErrorKind::Utf8(utf) => Some(utf),
            _ => Some(&self.0.kind),
        }
    }
}

/// Information about an error, which should be enclosed in an `Arc` to make cloning cheap.
#[derive(Debug)]
struct ErrorInner {
    kind: xml::reader::Error,
    stack: Vec<StackElement>,
    pos: TextPosition,
}

/// Broad category of an [`Error`], used to pick the error-log code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// The underlying reader failed.
    Io,

    /// The bytes weren't valid in the document's encoding.
    Encoding,

    /// An XML declaration appeared somewhere other than the very start.
    MisplacedDeclaration,

    /// Any other well-formedness failure, including premature end of input.
    Malformed,
}

/// Internal type-erased event source.
///
/// The type erasure reduces monomorphization bloat: there's only one
/// `XmlInputStream` type (and thus one copy of every element's read hooks)
/// no matter how many `std::io::Read` types are parsed.
trait EventSource {
    fn next_event(&mut self) -> Result<XmlEvent, xml::reader::Error>;
    fn pos(&self) -> TextPosition;
}

impl<R: std::io::Read> EventSource for xml::reader::EventReader<R> {
    fn next_event(&mut self) -> Result<XmlEvent, xml::reader::Error> {
        self.next()
    }

    fn pos(&self) -> TextPosition {
        self.position()
    }
}

/// A peekable stream of [`XmlToken`]s.
///
/// Comments and processing instructions are dropped. CDATA sections and
/// whitespace arrive as text tokens. Once the underlying parser fails or
/// reaches the end of the document, [`XmlInputStream::is_good`] returns false.
pub struct XmlInputStream<'r> {
    inner: Box<dyn EventSource + 'r>,

    /// The token returned by the next `peek` or `next`.
    peeked: Option<XmlToken>,

    /// A token read ahead while checking whether a start tag is immediately closed.
    pending: Option<XmlToken>,

    /// In-scope namespaces of each open element, as reported by xml-rs.
    scopes: Vec<xml::namespace::Namespace>,
    stack: Vec<StackElement>,

    error: Option<Error>,
    failed: bool,
    finished: bool,
    encoding: Option<String>,
    xml_version: Option<String>,
    eof: XmlToken,
}

impl<'r> XmlInputStream<'r> {
    pub fn new<R: std::io::Read + 'r>(source: R) -> Self {
        let config = xml::ParserConfig::new()
            .cdata_to_characters(true)
            .whitespace_to_characters(true)
            .ignore_comments(true);
        Self {
            inner: Box::new(xml::reader::EventReader::new_with_config(source, config)),
            peeked: None,
            pending: None,
            scopes: Vec::new(),
            stack: Vec::new(),
            error: None,
            failed: false,
            finished: false,
            encoding: None,
            xml_version: None,
            eof: XmlToken::eof(),
        }
    }

    /// Returns a stream over the given string.
    ///
    /// This is simply `new(source.as_bytes())`; it's common enough to merit a
    /// convenience method.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &'r str) -> Self {
        Self::new(source.as_bytes())
    }

    /// Returns the next token without consuming it.
    ///
    /// At the end of input (or after an error) this is an end-of-input token.
    pub fn peek(&mut self) -> &XmlToken {
        self.fill();
        self.peeked.as_ref().unwrap_or(&self.eof)
    }

    /// Consumes and returns the next token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> XmlToken {
        self.fill();
        self.peeked.take().unwrap_or_else(XmlToken::eof)
    }

    /// True while there are tokens left and no parse error has occurred.
    pub fn is_good(&mut self) -> bool {
        self.fill();
        !self.failed && self.peeked.is_some()
    }

    /// True once the parser has reported an error.
    pub fn is_error(&self) -> bool {
        self.failed
    }

    /// Consumes tokens through the end tag matching `element`.
    ///
    /// Does nothing if `element` is itself an end (as an empty element is).
    pub fn skip_past_end(&mut self, element: &XmlToken) {
        if element.is_end() {
            return;
        }
        debug!("skipping <{}> and its content", element.triple().prefixed_name());
        let mut depth = 1usize;
        while self.is_good() {
            let t = self.next();
            if t.is_start() && !t.is_end() {
                depth += 1;
            } else if t.is_end() && !t.is_start() {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Consumes any text tokens at the front of the stream.
    pub fn skip_text(&mut self) {
        while self.is_good() && self.peek().is_text() {
            self.next();
        }
    }

    /// The encoding named in the XML declaration (`UTF-8` if none was given).
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// The XML version named in the XML declaration.
    pub fn xml_version(&self) -> Option<&str> {
        self.xml_version.as_deref()
    }

    /// Returns the parse error, if one occurred and hasn't been taken yet.
    ///
    /// The stream stays failed after the error is taken.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Number of elements currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn fill(&mut self) {
        if self.peeked.is_some() {
            return;
        }
        let mut token = match self.next_raw() {
            Some(t) => t,
            None => return,
        };
        if token.is_start() {
            match self.next_raw() {
                Some(next) if next.is_end_for(&token) => token.set_end(),
                Some(next) => self.pending = Some(next),
                None => {}
            }
        }
        self.peeked = Some(token);
    }

    /// Converts the next significant parser event into a token.
    fn next_raw(&mut self) -> Option<XmlToken> {
        if let Some(t) = self.pending.take() {
            return Some(t);
        }
        if self.finished || self.failed {
            return None;
        }
        loop {
            let event = match self.inner.next_event() {
                Ok(e) => e,
                Err(e) => {
                    debug!("XML parser failed: {}", &e);
                    self.error = Some(Error::xml(&self.stack, e));
                    self.failed = true;
                    return None;
                }
            };
            let pos = self.inner.pos();
            let line = pos.row as u32 + 1;
            let column = pos.column as u32 + 1;
            match event {
                XmlEvent::StartDocument {
                    version, encoding, ..
                } => {
                    self.xml_version = Some(version.to_string());
                    self.encoding = Some(encoding);
                }
                XmlEvent::StartElement {
                    name,
                    attributes,
                    namespace,
                } => {
                    trace!("Starting {}, new depth {}", &name, self.stack.len() + 1);
                    let triple = XmlTriple::from_xml_name(&name);
                    let declared = self.declared(&namespace);
                    let mut attrs = XmlAttributes::new();
                    for a in &attributes {
                        attrs.add_triple(XmlTriple::from_xml_name(&a.name), &a.value);
                    }
                    self.scopes.push(namespace);
                    self.stack.push(StackElement {
                        name: triple.clone(),
                        pos,
                    });
                    return Some(XmlToken::start(triple, attrs, declared, line, column));
                }
                XmlEvent::EndElement { name } => {
                    trace!(
                        "Ending {}, new depth {}",
                        &name,
                        self.stack.len().saturating_sub(1)
                    );
                    self.scopes.pop();
                    self.stack.pop();
                    return Some(XmlToken::end(XmlTriple::from_xml_name(&name), line, column));
                }
                XmlEvent::Characters(s) | XmlEvent::CData(s) | XmlEvent::Whitespace(s) => {
                    return Some(XmlToken::text(s, line, column));
                }
                XmlEvent::EndDocument => {
                    self.finished = true;
                    return None;
                }
                _ => continue,
            }
        }
    }

    /// Returns the mappings newly declared on an element, given its full in-scope set.
    fn declared(&self, in_scope: &xml::namespace::Namespace) -> XmlNamespaces {
        let parent = self.scopes.last();
        let mut declared = XmlNamespaces::new();
        for (prefix, uri) in in_scope {
            if prefix == xml::namespace::NS_XML_PREFIX || prefix == xml::namespace::NS_XMLNS_PREFIX {
                continue;
            }
            let inherited = match parent {
                Some(p) => p.get(prefix) == Some(uri),
                None => prefix.is_empty() && uri.is_empty(),
            };
            if !inherited {
                declared.add(uri, prefix);
            }
        }
        declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn init() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
    }

    #[test]
    fn bad_xml() {
        init();
        let mut stream = XmlInputStream::from_str("<a><b></a>");
        while stream.is_good() {
            stream.next();
        }
        assert!(stream.is_error());
        let e = stream.take_error().unwrap();
        assert_eq!(e.class(), ErrorClass::Malformed);
        assert!(stream.take_error().is_none());
        assert!(!stream.is_good());
    }

    #[test]
    fn empty_element_is_one_token() {
        init();
        let mut stream = XmlInputStream::from_str(r#"<?xml version="1.0"?><root><a/><b></b></root>"#);
        let root = stream.next();
        assert!(root.is_start() && !root.is_end());
        let a = stream.next();
        assert_eq!(a.name(), "a");
        assert!(a.is_start() && a.is_end());
        let b = stream.next();
        assert!(b.is_start() && b.is_end());
        assert!(stream.next().is_end_for(&root));
        assert!(!stream.is_good());
        assert!(!stream.is_error());
        assert_eq!(stream.encoding(), Some("UTF-8"));
    }

    #[test]
    fn declared_namespaces_only() {
        init();
        let mut stream = XmlInputStream::from_str(
            r#"<root xmlns="http://example.com/d" xmlns:p="http://example.com/p"><p:child xmlns:q="http://example.com/q"/></root>"#,
        );
        let root = stream.next();
        assert_eq!(root.uri(), "http://example.com/d");
        assert_eq!(root.namespaces().len(), 2);
        assert_eq!(root.namespaces().uri_for_prefix("p"), Some("http://example.com/p"));
        let child = stream.next();
        assert_eq!(child.prefix(), "p");
        assert_eq!(child.uri(), "http://example.com/p");
        assert_eq!(child.namespaces().len(), 1);
        assert_eq!(child.namespaces().uri_for_prefix("q"), Some("http://example.com/q"));
    }

    #[test]
    fn text_and_positions() {
        init();
        let mut stream = XmlInputStream::from_str("<a>\n  <b>hi</b>\n</a>");
        let a = stream.next();
        assert_eq!(a.line(), 1);
        assert!(stream.peek().is_text());
        stream.skip_text();
        let b = stream.next();
        assert_eq!(b.name(), "b");
        assert_eq!(b.line(), 2);
        assert_matches!(stream.next().characters(), "hi");
    }

    #[test]
    fn skip_past_end_handles_nesting() {
        init();
        let mut stream = XmlInputStream::from_str("<r><x><x><y/></x></x><z/></r>");
        stream.next();
        let x = stream.next();
        stream.skip_past_end(&x);
        assert_eq!(stream.peek().name(), "z");
        assert_eq!(stream.depth(), 1);
    }
}
