// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object model, reader and writer for SED-ML, the Simulation Experiment
//! Description Markup Language.
//!
//! A [`SedDocument`] owns every element of a document in an arena and hands
//! out [`ElementId`] handles. State common to all elements (identifiers,
//! notes, annotation) lives in each element's [`SedBase`]; kind-specific
//! state lives behind the [`SedObject`] trait.
//!
//! ```
//! let doc = sedml::read_sedml_from_string(
//!     r#"<sedML xmlns="http://sed-ml.org/sed-ml/level1/version4" level="1" version="4"/>"#,
//! );
//! assert_eq!(doc.num_errors(), 0);
//! let xml = sedml::write_sedml_to_string(&doc).unwrap();
//! assert!(xml.contains("<sedML"));
//! ```

pub mod base;
pub mod de;
pub mod document;
pub mod elements;
pub mod error;
pub mod list_of;
pub mod namespaces;
pub mod node;
pub mod object;
pub mod reader;
pub mod ser;
pub mod syntax;
pub mod token;
pub mod writer;

pub use base::SedBase;
pub use document::{ElementId, SedDocument};
pub use error::{
    result_code, ConstructorError, OpResult, OperationError, SedError, SedErrorCode, SedErrorLog, Severity,
};
pub use list_of::SedListOf;
pub use namespaces::SedNamespaces;
pub use node::XmlNode;
pub use object::{SedObject, TypeCode};
pub use reader::{read_sedml_from_file, read_sedml_from_string, SedReader};
pub use writer::{write_sedml_to_string, SedWriter};

pub use xml::common::TextPosition;

pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespaces used by RDF annotations.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
pub const BQBIOL_NS: &str = "http://biomodels.net/biology-qualifiers/";
pub const BQMODEL_NS: &str = "http://biomodels.net/model-qualifiers/";
pub const VCARD_NS: &str = "http://www.w3.org/2001/vcard-rdf/3.0#";
