// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push-style XML output, used when writing SED-ML.

use std::{borrow::Cow, io::Write};

use log::trace;
use xml::writer::XmlEvent;

use crate::node::{NodeKind, XmlNode};

/// An error while serializing.
///
/// Once a write fails, the underlying writer is poisoned and every later
/// write fails with the same error.
#[derive(Clone, Debug)]
pub struct Error(pub String);

impl Error {
    pub fn no_open_start_tag(what: &str) -> Error {
        Error(format!("can't write {} outside a start tag", what))
    }

    pub fn unbalanced(depth: usize) -> Error {
        Error(format!("document finished with {} element(s) still open", depth))
    }

    pub fn unexpected_end() -> Error {
        Error("end element without matching start".to_owned())
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        self.0.fmt(f)
    }
}

struct WrappedWriter<W: std::io::Write> {
    inner: xml::writer::EventWriter<W>,

    /// When `Some`, all futures writes and the overall operation should fail with this error.
    poison: Option<Error>,
}

/// A type-erased version of [`WrappedWriter`], to avoid monomorphization bloat.
trait ErasedEventWriter {
    /// Writes the event, poisoning the writer on failure.
    fn write(&mut self, event: XmlEvent) -> Result<(), Error>;

    /// Explicitly poison the writer.
    fn poison(&mut self, error: Error);
}

impl<W: Write> ErasedEventWriter for WrappedWriter<W> {
    fn write(&mut self, event: XmlEvent) -> Result<(), Error> {
        if let Some(ref poison) = self.poison {
            return Err(poison.clone());
        }
        if let Err(e) = self.inner.write(event) {
            let wrapped = Error(e.to_string());
            self.poison = Some(wrapped.clone());
            return Err(wrapped);
        }
        Ok(())
    }

    fn poison(&mut self, error: Error) {
        self.poison.get_or_insert(error);
    }
}

/// A start tag which may still gain attributes and namespace declarations.
struct PendingStart {
    name: String,
    prefix: String,

    /// `(local name, prefix, value)`.
    attributes: Vec<(String, String, String)>,
    namespaces: xml::namespace::Namespace,
}

fn xml_name<'a>(local_name: &'a str, prefix: &'a str) -> xml::name::Name<'a> {
    xml::name::Name {
        local_name,
        namespace: None, // unused by xml::writer
        prefix: if prefix.is_empty() { None } else { Some(prefix) },
    }
}

/// Writes XML one piece at a time.
///
/// A start tag stays open until the next content, end tag, or start tag, so
/// [`XmlOutputStream::write_namespace`] and [`XmlOutputStream::write_attribute`]
/// apply to the most recently started element.
pub struct XmlOutputStream<'w> {
    writer: &'w mut dyn ErasedEventWriter,
    pending: Option<PendingStart>,
    depth: usize,
}

impl<'w> XmlOutputStream<'w> {
    fn new(writer: &'w mut dyn ErasedEventWriter) -> Self {
        Self {
            writer,
            pending: None,
            depth: 0,
        }
    }

    /// Writes the `<?xml version="1.0" encoding="UTF-8"?>` declaration.
    pub fn start_document(&mut self) -> Result<(), Error> {
        self.writer.write(XmlEvent::StartDocument {
            version: xml::common::XmlVersion::Version10,
            encoding: Some("UTF-8"),
            standalone: None,
        })
    }

    pub fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.flush()?;
        self.writer.write(XmlEvent::Comment(text))
    }

    pub fn start_element(&mut self, name: &str, prefix: &str) -> Result<(), Error> {
        self.flush()?;
        trace!("Starting {}, new depth {}", name, self.depth + 1);
        self.pending = Some(PendingStart {
            name: name.to_owned(),
            prefix: prefix.to_owned(),
            attributes: Vec::new(),
            namespaces: xml::namespace::Namespace::empty(),
        });
        self.depth += 1;
        Ok(())
    }

    /// Declares `prefix` (empty for the default namespace) on the open start tag.
    ///
    /// Declarations already in scope with the same URI are not repeated.
    pub fn write_namespace(&mut self, uri: &str, prefix: &str) -> Result<(), Error> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| Error::no_open_start_tag("namespace declaration"))?;
        pending.namespaces.force_put(prefix, uri);
        Ok(())
    }

    pub fn write_attribute(&mut self, name: &str, prefix: &str, value: &str) -> Result<(), Error> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| Error::no_open_start_tag("attribute"))?;
        match pending
            .attributes
            .iter_mut()
            .find(|(n, p, _)| n == name && p == prefix)
        {
            Some(existing) => existing.2 = value.to_owned(),
            None => pending
                .attributes
                .push((name.to_owned(), prefix.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    pub fn characters(&mut self, text: &str) -> Result<(), Error> {
        self.flush()?;
        self.writer.write(XmlEvent::Characters(text))
    }

    pub fn end_element(&mut self, name: &str, _prefix: &str) -> Result<(), Error> {
        self.flush()?;
        if self.depth == 0 {
            let e = Error::unexpected_end();
            self.writer.poison(e.clone());
            return Err(e);
        }
        self.depth -= 1;
        trace!("Ending {}, new depth {}", name, self.depth);
        self.writer.write(XmlEvent::EndElement { name: None })
    }

    /// Writes a whole tree. A fragment writes just its children.
    pub fn write_node(&mut self, node: &XmlNode) -> Result<(), Error> {
        match node.kind() {
            NodeKind::Text => self.characters(node.characters()),
            NodeKind::Fragment => {
                for c in node.children() {
                    self.write_node(c)?;
                }
                Ok(())
            }
            NodeKind::Element => {
                self.start_element(node.name(), node.prefix())?;
                for (prefix, uri) in node.namespaces().iter() {
                    self.write_namespace(uri, prefix)?;
                }
                for (t, v) in node.attributes().iter() {
                    self.write_attribute(&t.name, &t.prefix, v)?;
                }
                for c in node.children() {
                    self.write_node(c)?;
                }
                self.end_element(node.name(), node.prefix())
            }
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        let pending = match self.pending.take() {
            Some(p) => p,
            None => return Ok(()),
        };
        self.writer.write(XmlEvent::StartElement {
            name: xml_name(&pending.name, &pending.prefix),
            attributes: Cow::Owned(
                pending
                    .attributes
                    .iter()
                    .map(|(n, p, v)| xml::attribute::Attribute {
                        name: xml_name(n, p),
                        value: v,
                    })
                    .collect::<Vec<_>>(),
            ),
            namespace: Cow::Borrowed(&pending.namespaces),
        })
    }

    fn finish(mut self) -> Result<(), Error> {
        self.flush()?;
        if self.depth != 0 {
            let e = Error::unbalanced(self.depth);
            self.writer.poison(e.clone());
            return Err(e);
        }
        Ok(())
    }
}

/// Output settings; runs a closure against an [`XmlOutputStream`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Serializer {
    perform_indent: bool,
    fragment: bool,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets if the output should be indented; defaults to false.
    #[inline]
    pub fn perform_indent(self, perform_indent: bool) -> Self {
        Self {
            perform_indent,
            ..self
        }
    }

    /// Sets if output is a fragment, written without an XML declaration; defaults to false.
    #[inline]
    pub fn fragment(self, fragment: bool) -> Self {
        Self { fragment, ..self }
    }

    /// Serializes to any `Write` impl.
    pub fn to<W, F>(self, writer: W, body: F) -> Result<(), Error>
    where
        W: Write,
        F: FnOnce(&mut XmlOutputStream) -> Result<(), Error>,
    {
        let mut writer = WrappedWriter {
            inner: xml::writer::EventWriter::new_with_config(
                writer,
                xml::writer::EmitterConfig {
                    perform_indent: self.perform_indent,
                    write_document_declaration: !self.fragment,
                    ..Default::default()
                },
            ),
            poison: None,
        };
        let mut stream = XmlOutputStream::new(&mut writer);
        body(&mut stream)?;
        stream.finish()
    }

    /// Serializes to a `String`.
    pub fn to_string<F>(self, body: F) -> Result<String, Error>
    where
        F: FnOnce(&mut XmlOutputStream) -> Result<(), Error>,
    {
        let mut out = Vec::new();
        self.to(&mut out, body)?;
        String::from_utf8(out).map_err(|e| Error(format!("xml-rs produced invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn element_with_namespaces_and_attributes() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
        let out = Serializer::new()
            .to_string(|s| {
                s.start_document()?;
                s.start_element("sedML", "")?;
                s.write_namespace("http://example.com/d", "")?;
                s.write_namespace("http://example.com/p", "p")?;
                s.write_attribute("level", "", "1")?;
                s.start_element("child", "p")?;
                s.write_attribute("attr", "p", "v")?;
                s.characters("a < b")?;
                s.end_element("child", "p")?;
                s.start_element("empty", "")?;
                s.end_element("empty", "")?;
                s.end_element("sedML", "")
            })
            .unwrap();
        let reader = xml::reader::EventReader::new(out.as_bytes());
        let events: Result<Vec<_>, _> = reader.into_iter().collect();
        let events = events.unwrap();
        use xml::reader::XmlEvent;
        assert_matches!(&events[..], [
            XmlEvent::StartDocument { .. },
            XmlEvent::StartElement { name: root, attributes: root_attrs, .. },
            XmlEvent::StartElement { name: child, attributes: child_attrs, .. },
            XmlEvent::Characters(t),
            XmlEvent::EndElement { .. },
            XmlEvent::StartElement { name: empty, .. },
            XmlEvent::EndElement { .. },
            XmlEvent::EndElement { .. },
            XmlEvent::EndDocument,
        ] => {
            assert_eq!(root.local_name, "sedML");
            assert_eq!(root.namespace.as_deref(), Some("http://example.com/d"));
            assert_eq!(root_attrs[0].value, "1");
            assert_eq!(child.namespace.as_deref(), Some("http://example.com/p"));
            assert_eq!(child_attrs[0].name.namespace.as_deref(), Some("http://example.com/p"));
            assert_eq!(t, "a < b");
            assert_eq!(empty.namespace.as_deref(), Some("http://example.com/d"));
        });
    }

    #[test]
    fn attribute_outside_start_tag_fails() {
        let r = Serializer::new().fragment(true).to_string(|s| {
            s.start_element("a", "")?;
            s.characters("x")?;
            s.write_attribute("late", "", "1")
        });
        assert!(r.is_err());
    }

    #[test]
    fn unbalanced_fails() {
        let r = Serializer::new()
            .fragment(true)
            .to_string(|s| s.start_element("a", ""));
        assert_matches!(r, Err(Error(msg)) if msg.contains("still open"));
    }
}
