// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading SED-ML documents.
//!
//! Reading never fails outright: every problem, from unreadable files to
//! malformed XML, ends up in the returned document's error log.

use std::io::Read;
use std::path::Path;

use log::debug;

use crate::de::{ErrorClass, XmlInputStream};
use crate::document::SedDocument;
use crate::error::SedErrorCode;
use crate::namespaces::level_version_for_uri;
use crate::token::XmlToken;

/// Reads SED-ML documents from strings, byte streams or files.
#[derive(Copy, Clone, Debug, Default)]
pub struct SedReader {
    _private: (),
}

impl SedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_from_string(&self, xml: &str) -> SedDocument {
        self.read_bytes(xml.as_bytes())
    }

    /// Reads a whole document from `source`.
    pub fn read<R: Read>(&self, mut source: R) -> SedDocument {
        let mut buf = Vec::new();
        match source.read_to_end(&mut buf) {
            Ok(_) => self.read_bytes(&buf),
            Err(e) => unreadable(&e.to_string()),
        }
    }

    pub fn read_from_file<P: AsRef<Path>>(&self, path: P) -> SedDocument {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(buf) => self.read_bytes(&buf),
            Err(e) => unreadable(&format!("{}: {}", path.display(), e)),
        }
    }

    fn read_bytes(&self, bytes: &[u8]) -> SedDocument {
        let mut doc = SedDocument::default();
        let body = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
        if body.starts_with(b"<?xml") {
            let end = find(body, b"?>").unwrap_or(body.len());
            if find(&body[..end], b"encoding").is_none() {
                log(&mut doc, SedErrorCode::MissingXmlEncoding, "", 1, 1);
            }
        } else {
            // Read as UTF-8 XML 1.0, with positions relative to the input as given.
            debug!("no XML declaration; assuming UTF-8");
        }

        let mut stream = XmlInputStream::new(body);
        if stream.peek().is_start() {
            let root = stream.peek().clone();
            if root.name() == "sedML" {
                preset_level_version(&mut doc, &root);
                let id = doc.root();
                doc.read_element(id, &mut stream);
            } else {
                log(
                    &mut doc,
                    SedErrorCode::SedNotSchemaConformant,
                    &format!("The root element of a SED-ML document must be <sedML>, not <{}>.", root.name()),
                    root.line(),
                    root.column(),
                );
                let root = stream.next();
                stream.skip_past_end(&root);
            }
        }

        if let Some(e) = stream.take_error() {
            let code = match e.class() {
                ErrorClass::Io => SedErrorCode::XmlFileUnreadable,
                ErrorClass::Encoding => SedErrorCode::SedNotUtf8,
                ErrorClass::MisplacedDeclaration => SedErrorCode::BadXmlDeclLocation,
                ErrorClass::Malformed => SedErrorCode::BadlyFormedXml,
            };
            let pos = e.position();
            log(
                &mut doc,
                code,
                &e.to_string(),
                pos.row as u32 + 1,
                pos.column as u32 + 1,
            );
        }

        if doc.error_log().errors().iter().any(|e| e.code.is_critical()) {
            debug!("critical XML error; dropping other diagnostics");
            doc.error_log_mut().retain(|e| e.code.is_critical());
        } else {
            if let Some(encoding) = stream.encoding() {
                if !encoding.eq_ignore_ascii_case("UTF-8") {
                    log(&mut doc, SedErrorCode::SedNotUtf8, "", 1, 1);
                }
            }
            if let Some(version) = stream.xml_version() {
                if version != "1.0" {
                    log(&mut doc, SedErrorCode::BadXmlDecl, "", 1, 1);
                }
            }
        }
        doc
    }
}

/// Reads a SED-ML document from a string.
pub fn read_sedml_from_string(xml: &str) -> SedDocument {
    SedReader::new().read_from_string(xml)
}

/// Reads a SED-ML document from a file.
pub fn read_sedml_from_file<P: AsRef<Path>>(path: P) -> SedDocument {
    SedReader::new().read_from_file(path)
}

fn unreadable(message: &str) -> SedDocument {
    let mut doc = SedDocument::default();
    log(&mut doc, SedErrorCode::XmlFileUnreadable, message, 0, 0);
    doc
}

fn log(doc: &mut SedDocument, code: SedErrorCode, message: &str, line: u32, column: u32) {
    let (level, version) = (doc.level(), doc.version());
    doc.error_log_mut().log(code, level, version, message, line, column);
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Sets the document's level and version before the root is read, so that
/// every element is checked against the right namespace.
fn preset_level_version(doc: &mut SedDocument, root: &XmlToken) {
    let attr = |name: &str| root.attributes().value(name).and_then(|v| v.trim().parse::<u32>().ok());
    let lv = match (attr("level"), attr("version")) {
        (Some(l), Some(v)) => Some((l, v)),
        _ => level_version_for_uri(root.uri()),
    };
    if let Some((level, version)) = lv {
        debug!("document declares level {} version {}", level, version);
        doc.set_level_version_unchecked(level, version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
    }

    #[test]
    fn declaration_checks() {
        init();
        let doc = read_sedml_from_string(
            r#"<?xml version="1.0"?><sedML xmlns="http://sed-ml.org/sed-ml/level1/version4" level="1" version="4"/>"#,
        );
        assert!(doc.error_log().contains(SedErrorCode::MissingXmlEncoding));
        assert_eq!(doc.num_errors(), 1);

        let doc = read_sedml_from_string(
            r#"<sedML xmlns="http://sed-ml.org/sed-ml/level1/version3" level="1" version="3"/>"#,
        );
        assert_eq!(doc.num_errors(), 0);
        assert_eq!(doc.version(), 3);
    }

    #[test]
    fn positions_without_declaration() {
        init();
        let doc = read_sedml_from_string(r#"<sedML level="1" version="1"><unknownTag/></sedML>"#);
        assert_eq!(doc.num_errors(), 1);
        let e = doc.error(0).unwrap();
        assert_eq!(e.code, SedErrorCode::SedUnrecognizedElement);
        assert_eq!((e.line, e.column), (1, 30));
        assert_eq!(doc.base(doc.root()).unwrap().line(), 1);

        let doc = read_sedml_from_string("<sedML level=\"1\" version=\"1\">\n  <unknownTag/>\n</sedML>");
        assert_eq!((doc.error(0).unwrap().line, doc.error(0).unwrap().column), (2, 3));
    }

    #[test]
    fn critical_errors_prune() {
        init();
        let doc = read_sedml_from_string(
            r#"<?xml version="1.0" encoding="UTF-8"?><sedML xmlns="http://sed-ml.org/sed-ml/level1/version4" level="1" version="4" bogus="x"><listOfModels>"#,
        );
        assert!(doc.error_log().contains(SedErrorCode::BadlyFormedXml));
        assert!(doc.error_log().errors().iter().all(|e| e.code.is_critical()));
    }

    #[test]
    fn missing_file() {
        init();
        let doc = read_sedml_from_file("/nonexistent/dir/file.sedml");
        assert!(doc.error_log().contains(SedErrorCode::XmlFileUnreadable));
    }
}
