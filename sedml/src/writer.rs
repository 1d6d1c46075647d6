// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing SED-ML documents.

use std::io::Write;
use std::path::Path;

use crate::document::SedDocument;
use crate::ser::{self, Serializer, XmlOutputStream};

/// Writes SED-ML documents; configure with the builder methods.
#[derive(Clone, Debug)]
pub struct SedWriter {
    perform_indent: bool,
    program_name: Option<String>,
    program_version: Option<String>,
}

impl Default for SedWriter {
    fn default() -> Self {
        Self {
            perform_indent: true,
            program_name: None,
            program_version: None,
        }
    }
}

impl SedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets if the output should be indented; defaults to true.
    #[inline]
    pub fn perform_indent(self, perform_indent: bool) -> Self {
        Self {
            perform_indent,
            ..self
        }
    }

    /// Names the program in a "Created by" comment. Only written if
    /// [`SedWriter::program_version`] is also set.
    pub fn program_name(self, name: &str) -> Self {
        Self {
            program_name: Some(name.to_owned()),
            ..self
        }
    }

    pub fn program_version(self, version: &str) -> Self {
        Self {
            program_version: Some(version.to_owned()),
            ..self
        }
    }

    fn body(&self, doc: &SedDocument, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        stream.start_document()?;
        if let (Some(name), Some(version)) = (&self.program_name, &self.program_version) {
            stream.comment(&format!(" Created by {} version {} ", name, version))?;
        }
        doc.write_element(doc.root(), stream)
    }

    fn serializer(&self) -> Serializer {
        Serializer::new().perform_indent(self.perform_indent)
    }

    pub fn write_to<W: Write>(&self, doc: &SedDocument, writer: W) -> Result<(), ser::Error> {
        self.serializer().to(writer, |s| self.body(doc, s))
    }

    pub fn write_to_string(&self, doc: &SedDocument) -> Result<String, ser::Error> {
        self.serializer().to_string(|s| self.body(doc, s))
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, doc: &SedDocument, path: P) -> Result<(), ser::Error> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .map_err(|e| ser::Error(format!("unable to create {}: {}", path.display(), e)))?;
        let mut out = std::io::BufWriter::new(file);
        self.write_to(doc, &mut out)?;
        out.flush()
            .map_err(|e| ser::Error(format!("unable to write {}: {}", path.display(), e)))
    }
}

/// Writes `doc` with the default settings.
pub fn write_sedml_to_string(doc: &SedDocument) -> Result<String, ser::Error> {
    SedWriter::new().write_to_string(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_by_comment() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
        let doc = SedDocument::new(1, 4);
        let out = SedWriter::new()
            .perform_indent(false)
            .program_name("sedml-test")
            .program_version("0.1")
            .write_to_string(&doc)
            .unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"), "{}", &out);
        assert!(out.contains("<!-- Created by sedml-test version 0.1 -->"), "{}", &out);
        assert!(out.contains("xmlns=\"http://sed-ml.org/sed-ml/level1/version4\""), "{}", &out);
        assert!(out.contains("level=\"1\""), "{}", &out);
        assert!(!out.contains("listOfModels"), "{}", &out);

        let plain = SedWriter::new().program_name("only-name").write_to_string(&doc).unwrap();
        assert!(!plain.contains("Created by"), "{}", &plain);
    }
}
