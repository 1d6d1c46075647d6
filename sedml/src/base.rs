// SPDX-License-Identifier: MIT OR Apache-2.0

//! State shared by every SED-ML element: identifiers, notes, annotation,
//! provenance and namespaces.
//!
//! `SedBase` knows nothing about its position in a document. Operations which
//! need the tree (parent links, the error log, document-wide namespaces) live
//! on [`crate::SedDocument`], which delegates here for the per-element work.

use log::debug;

use crate::error::{ConstructorError, OpResult, OperationError, SedErrorCode};
use crate::namespaces::{is_sed_namespace, SedNamespaces};
use crate::node::XmlNode;
use crate::object::ExpectedAttributes;
use crate::ser::{self, XmlOutputStream};
use crate::syntax::{check_notes_content, is_correct_html_node, is_valid_sid, is_valid_xml_id};
use crate::token::{XmlAttributes, XmlNamespaces, XmlTriple};
use crate::{BQBIOL_NS, BQMODEL_NS, DCTERMS_NS, DC_NS, RDF_NS, VCARD_NS, XHTML_NS, XSI_NS};

/// Namespace of the wrapper [`SedBase::remove_duplicate_annotations`] collects duplicates into.
pub const DUPLICATE_ANNOTATION_NS: &str = "http://www.sbml.org/libsbml/annotation";

/// A problem found while reading, to be logged against the element.
pub(crate) type Problem = (SedErrorCode, String);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum NotesShape {
    /// A single `html` element holding `head` then `body`.
    Html,

    /// A single `body` element.
    Body,

    /// Any sequence of elements permitted within a body.
    Any,
}

#[derive(Clone, Debug)]
pub struct SedBase {
    metaid: String,
    id: String,
    name: String,
    notes: Option<XmlNode>,
    annotation: Option<XmlNode>,
    line: u32,
    column: u32,
    uri: String,
    namespaces: SedNamespaces,
    user_data: Option<u64>,
    id_allowed_pre_v4: bool,
    name_allowed_pre_v4: bool,
}

impl SedBase {
    pub fn new(level: u32, version: u32) -> Self {
        let namespaces = SedNamespaces::new(level, version);
        Self {
            metaid: String::new(),
            id: String::new(),
            name: String::new(),
            notes: None,
            annotation: None,
            line: 0,
            column: 0,
            uri: namespaces.uri().to_owned(),
            namespaces,
            user_data: None,
            id_allowed_pre_v4: false,
            name_allowed_pre_v4: false,
        }
    }

    /// Creates an element for the given namespaces, which must be supplied.
    pub fn with_namespaces(namespaces: Option<&SedNamespaces>) -> Result<Self, ConstructorError> {
        let namespaces = namespaces.ok_or_else(|| {
            ConstructorError("Unable to create SED-ML element: namespaces are missing".to_owned())
        })?;
        let mut base = Self::new(namespaces.level(), namespaces.version());
        base.namespaces = namespaces.clone();
        Ok(base)
    }

    pub(crate) fn set_pre_v4_rules(&mut self, id_allowed: bool, name_allowed: bool) {
        self.id_allowed_pre_v4 = id_allowed;
        self.name_allowed_pre_v4 = name_allowed;
    }

    pub fn level(&self) -> u32 {
        self.namespaces.level()
    }

    pub fn version(&self) -> u32 {
        self.namespaces.version()
    }

    pub fn namespaces(&self) -> &SedNamespaces {
        &self.namespaces
    }

    pub(crate) fn namespaces_mut(&mut self) -> &mut SedNamespaces {
        &mut self.namespaces
    }

    pub(crate) fn set_level_version(&mut self, level: u32, version: u32) {
        let was_core = self.uri == self.namespaces.uri();
        self.namespaces.set_level_version(level, version);
        if was_core {
            self.uri = self.namespaces.uri().to_owned();
        }
    }

    /// The XML namespace this element's tag belongs to.
    pub fn element_namespace(&self) -> &str {
        &self.uri
    }

    pub fn set_element_namespace(&mut self, uri: &str) -> OpResult {
        self.uri = uri.to_owned();
        Ok(())
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub(crate) fn set_position(&mut self, line: u32, column: u32) {
        self.line = line;
        self.column = column;
    }

    pub fn user_data(&self) -> Option<u64> {
        self.user_data
    }

    pub fn set_user_data(&mut self, data: u64) {
        self.user_data = Some(data);
    }

    pub fn is_set_user_data(&self) -> bool {
        self.user_data.is_some()
    }

    pub fn unset_user_data(&mut self) {
        self.user_data = None;
    }

    fn pre_v4(&self) -> bool {
        self.level() == 1 && self.version() < 4
    }

    fn id_allowed(&self) -> bool {
        self.id_allowed_pre_v4 || !self.pre_v4()
    }

    fn name_allowed(&self) -> bool {
        self.name_allowed_pre_v4 || !self.pre_v4()
    }

    // ---- metaid / id / name ----

    pub fn metaid(&self) -> &str {
        &self.metaid
    }

    pub fn is_set_metaid(&self) -> bool {
        !self.metaid.is_empty()
    }

    /// Sets the metaid. Empty clears it. Level 1 elements have no metaid.
    pub fn set_metaid(&mut self, metaid: &str) -> OpResult {
        if self.level() == 1 {
            return Err(OperationError::UnexpectedAttribute);
        }
        if metaid.is_empty() {
            self.metaid.clear();
            return Ok(());
        }
        if !is_valid_xml_id(metaid) {
            return Err(OperationError::InvalidAttributeValue);
        }
        self.metaid = metaid.to_owned();
        Ok(())
    }

    pub fn unset_metaid(&mut self) -> OpResult {
        self.metaid.clear();
        Ok(())
    }

    pub fn id(&self) -> &str {
        if self.id_allowed() {
            &self.id
        } else {
            ""
        }
    }

    pub fn is_set_id(&self) -> bool {
        !self.id().is_empty()
    }

    pub fn set_id(&mut self, id: &str) -> OpResult {
        if id.is_empty() {
            self.id.clear();
            return Ok(());
        }
        if !is_valid_sid(id) {
            return Err(OperationError::InvalidAttributeValue);
        }
        if !self.id_allowed() {
            return Err(OperationError::UnexpectedAttribute);
        }
        self.id = id.to_owned();
        Ok(())
    }

    pub fn unset_id(&mut self) -> OpResult {
        self.id.clear();
        Ok(())
    }

    pub fn name(&self) -> &str {
        if self.name_allowed() {
            &self.name
        } else {
            ""
        }
    }

    pub fn is_set_name(&self) -> bool {
        !self.name().is_empty()
    }

    pub fn set_name(&mut self, name: &str) -> OpResult {
        if name.is_empty() {
            self.name.clear();
            return Ok(());
        }
        if !self.name_allowed() {
            return Err(OperationError::UnexpectedAttribute);
        }
        self.name = name.to_owned();
        Ok(())
    }

    pub fn unset_name(&mut self) -> OpResult {
        self.name.clear();
        Ok(())
    }

    // ---- notes ----

    pub fn notes(&self) -> Option<&XmlNode> {
        self.notes.as_ref()
    }

    pub fn is_set_notes(&self) -> bool {
        self.notes.is_some()
    }

    /// Serialized notes, or an empty string when unset.
    pub fn notes_string(&self) -> String {
        self.notes.as_ref().map(XmlNode::to_xml_string).unwrap_or_default()
    }

    pub fn unset_notes(&mut self) -> OpResult {
        self.notes = None;
        Ok(())
    }

    /// True if notes must follow the XHTML content rules at this level and version.
    pub(crate) fn requires_xhtml(&self) -> bool {
        let (level, version) = (self.level(), self.version());
        level > 2 || (level == 2 && version > 1)
    }

    fn xhtml_ok(&self, notes: &XmlNode) -> bool {
        !self.requires_xhtml() || check_notes_content(notes, Some(self.namespaces.namespaces())).is_empty()
    }

    /// Replaces the notes, wrapping `notes` in a `<notes>` element unless it already is one.
    ///
    /// `None` removes the notes.
    pub fn set_notes(&mut self, notes: Option<&XmlNode>) -> OpResult {
        let notes = match notes {
            None => {
                self.notes = None;
                return Ok(());
            }
            Some(n) => n,
        };
        let new = if notes.is_element() && notes.name() == "notes" {
            notes.clone()
        } else {
            let mut wrapper = XmlNode::element("notes", "", "");
            if notes.is_fragment() {
                for c in notes.children() {
                    wrapper.add_child(c.clone());
                }
            } else {
                wrapper.add_child(notes.clone());
            }
            wrapper
        };
        if !self.xhtml_ok(&new) {
            debug!("rejecting notes which aren't valid XHTML");
            return Err(OperationError::InvalidObject);
        }
        self.notes = Some(new);
        Ok(())
    }

    /// Replaces the notes with parsed content; an empty string removes them.
    ///
    /// With `add_xhtml_markup`, plain text is wrapped in an XHTML `<p>`.
    pub fn set_notes_str(&mut self, notes: &str, add_xhtml_markup: bool) -> OpResult {
        let ns = self.namespaces.namespaces().clone();
        self.set_notes_str_in(notes, add_xhtml_markup, Some(&ns))
    }

    pub(crate) fn set_notes_str_in(
        &mut self,
        notes: &str,
        add_xhtml_markup: bool,
        namespaces: Option<&XmlNamespaces>,
    ) -> OpResult {
        if notes.is_empty() {
            return self.unset_notes();
        }
        let node = XmlNode::parse_fragment(notes, namespaces).ok_or(OperationError::OperationFailed)?;
        if add_xhtml_markup && node.is_text() {
            let mut xmlns = XmlNamespaces::new();
            xmlns.add(XHTML_NS, "");
            let mut p = XmlNode::new_element(XmlTriple::new("p", XHTML_NS, ""), XmlAttributes::new(), xmlns);
            p.add_child(node);
            return self.set_notes(Some(&p));
        }
        self.set_notes(Some(&node))
    }

    /// Merges `notes` into the existing notes.
    ///
    /// Both sides are classified as a full `html` document, a `body`, or a
    /// run of body content, and spliced so existing content comes first.
    pub fn append_notes(&mut self, notes: &XmlNode) -> OpResult {
        let (added, added_shape) = if notes.is_element() && notes.name() == "notes" {
            match notes.child(0) {
                None => return Ok(()),
                Some(c) if c.name() == "html" => (c.clone(), NotesShape::Html),
                Some(c) if c.name() == "body" => (c.clone(), NotesShape::Body),
                Some(_) => (notes.clone(), NotesShape::Any),
            }
        } else if notes.is_fragment() {
            if notes.num_children() == 0 {
                return Ok(());
            }
            (notes.clone(), NotesShape::Any)
        } else if notes.is_element() && notes.name() == "html" {
            (notes.clone(), NotesShape::Html)
        } else if notes.is_element() && notes.name() == "body" {
            (notes.clone(), NotesShape::Body)
        } else {
            let mut f = XmlNode::new_fragment();
            f.add_child(notes.clone());
            (f, NotesShape::Any)
        };

        if added_shape == NotesShape::Html && !is_correct_html_node(&added) {
            return Err(OperationError::InvalidObject);
        }
        if self.requires_xhtml() {
            let mut tmp = XmlNode::element("notes", "", "");
            if added_shape == NotesShape::Any {
                for c in added.children() {
                    tmp.add_child(c.clone());
                }
            } else {
                tmp.add_child(added.clone());
            }
            if !self.xhtml_ok(&tmp) {
                debug!("rejecting appended notes which aren't valid XHTML");
                return Err(OperationError::InvalidObject);
            }
        }

        if self.notes.is_none() {
            return self.set_notes(Some(notes));
        }
        let cur = self.notes.as_mut().ok_or(OperationError::OperationFailed)?;
        let cur_shape = match cur.child(0) {
            Some(c) if c.name() == "html" => {
                if !is_correct_html_node(c) {
                    return Err(OperationError::InvalidObject);
                }
                NotesShape::Html
            }
            Some(c) if c.name() == "body" => NotesShape::Body,
            _ => NotesShape::Any,
        };

        match (cur_shape, added_shape) {
            (NotesShape::Html, _) => {
                let body = html_body_mut(cur.child_mut(0)).ok_or(OperationError::OperationFailed)?;
                let source = match added_shape {
                    NotesShape::Html => html_body(&added).ok_or(OperationError::OperationFailed)?,
                    _ => &added,
                };
                for c in source.children() {
                    body.add_child(c.clone());
                }
            }
            (NotesShape::Body, NotesShape::Html) => {
                let mut html = added;
                let body = html_body_mut(Some(&mut html)).ok_or(OperationError::OperationFailed)?;
                let existing = cur
                    .child_mut(0)
                    .map(XmlNode::take_children)
                    .unwrap_or_default();
                prepend_children(body, existing);
                cur.take_children();
                cur.add_child(html);
            }
            (NotesShape::Body, _) => {
                let body = cur.child_mut(0).ok_or(OperationError::OperationFailed)?;
                for c in added.children() {
                    body.add_child(c.clone());
                }
            }
            (NotesShape::Any, NotesShape::Html) => {
                let mut html = added;
                let body = html_body_mut(Some(&mut html)).ok_or(OperationError::OperationFailed)?;
                prepend_children(body, cur.take_children());
                cur.add_child(html);
            }
            (NotesShape::Any, NotesShape::Body) => {
                let mut body = added;
                prepend_children(&mut body, cur.take_children());
                cur.add_child(body);
            }
            (NotesShape::Any, NotesShape::Any) => {
                for c in added.children() {
                    cur.add_child(c.clone());
                }
            }
        }
        Ok(())
    }

    pub fn append_notes_str(&mut self, notes: &str) -> OpResult {
        let ns = self.namespaces.namespaces().clone();
        self.append_notes_str_in(notes, Some(&ns))
    }

    pub(crate) fn append_notes_str_in(&mut self, notes: &str, namespaces: Option<&XmlNamespaces>) -> OpResult {
        if notes.is_empty() {
            return Ok(());
        }
        let node = XmlNode::parse_fragment(notes, namespaces).ok_or(OperationError::OperationFailed)?;
        self.append_notes(&node)
    }

    /// Stores notes read from a document without validating them.
    pub(crate) fn replace_notes(&mut self, notes: XmlNode) {
        self.notes = Some(notes);
    }

    // ---- annotation ----

    pub fn annotation(&self) -> Option<&XmlNode> {
        self.annotation.as_ref()
    }

    pub fn is_set_annotation(&self) -> bool {
        self.annotation.is_some()
    }

    pub fn annotation_string(&self) -> String {
        self.annotation
            .as_ref()
            .map(XmlNode::to_xml_string)
            .unwrap_or_default()
    }

    pub fn unset_annotation(&mut self) -> OpResult {
        self.annotation = None;
        Ok(())
    }

    /// Stores `annotation`, collapsing it to unset when it has no children.
    pub(crate) fn replace_annotation(&mut self, annotation: XmlNode) {
        if annotation.num_children() == 0 {
            debug!("collapsing empty annotation");
            self.annotation = None;
        } else {
            self.annotation = Some(annotation);
        }
    }

    fn validate_annotation(&self, annotation: &XmlNode) -> OpResult {
        if declares_sed_namespace(annotation) {
            return Err(OperationError::InvalidObject);
        }
        if has_rdf_payload(annotation) && !self.is_set_metaid() {
            debug!("rejecting RDF annotation on element without metaid");
            return Err(OperationError::UnexpectedAttribute);
        }
        Ok(())
    }

    /// Replaces the annotation wholesale; `None` removes it.
    pub fn set_annotation(&mut self, annotation: Option<&XmlNode>) -> OpResult {
        let annotation = match annotation {
            None => {
                self.annotation = None;
                return Ok(());
            }
            Some(a) => a,
        };
        let new = wrap_annotation(annotation);
        self.validate_annotation(&new)?;
        self.replace_annotation(new);
        Ok(())
    }

    pub fn set_annotation_str(&mut self, annotation: &str) -> OpResult {
        let ns = self.namespaces.namespaces().clone();
        self.set_annotation_str_in(annotation, Some(&ns))
    }

    pub(crate) fn set_annotation_str_in(&mut self, annotation: &str, namespaces: Option<&XmlNamespaces>) -> OpResult {
        if annotation.is_empty() {
            return self.unset_annotation();
        }
        let node = XmlNode::parse_fragment(annotation, namespaces).ok_or(OperationError::OperationFailed)?;
        self.set_annotation(Some(&node))
    }

    /// Adds the top-level elements of `annotation` after the existing ones.
    ///
    /// An element whose name is already present is skipped, and the result is
    /// then [`OperationError::DuplicateAnnotationNs`], although the other
    /// elements are still added.
    pub fn append_annotation(&mut self, annotation: &XmlNode) -> OpResult {
        let new = wrap_annotation(annotation);
        if self.annotation.is_none() {
            return self.set_annotation(Some(&new));
        }
        let cur = self.annotation.as_ref().ok_or(OperationError::OperationFailed)?;
        let existing: Vec<&str> = cur
            .children()
            .iter()
            .filter(|c| c.is_element())
            .map(XmlNode::name)
            .collect();
        let mut merged = cur.clone();
        let mut duplicates = 0;
        for c in new.children() {
            if c.is_element() && existing.contains(&c.name()) {
                duplicates += 1;
            } else {
                merged.add_child(c.clone());
            }
        }
        self.validate_annotation(&merged)?;
        self.replace_annotation(merged);
        if duplicates > 0 {
            debug!("skipped {} duplicate annotation element(s)", duplicates);
            return Err(OperationError::DuplicateAnnotationNs);
        }
        Ok(())
    }

    pub fn append_annotation_str(&mut self, annotation: &str) -> OpResult {
        let ns = self.namespaces.namespaces().clone();
        self.append_annotation_str_in(annotation, Some(&ns))
    }

    pub(crate) fn append_annotation_str_in(&mut self, annotation: &str, namespaces: Option<&XmlNamespaces>) -> OpResult {
        let node = XmlNode::parse_fragment(annotation, namespaces).ok_or(OperationError::OperationFailed)?;
        self.append_annotation(&node)
    }

    /// Removes the first top-level annotation element named `name`.
    ///
    /// With a non-empty `uri`, the element must also be in that namespace.
    pub fn remove_top_level_annotation_element(&mut self, name: &str, uri: Option<&str>) -> OpResult {
        let annotation = match self.annotation.as_mut() {
            None => return Ok(()),
            Some(a) => a,
        };
        let index = annotation
            .index_of_child(name)
            .ok_or(OperationError::AnnotationNameNotFound)?;
        if let Some(uri) = uri.filter(|u| !u.is_empty()) {
            let child = annotation.child(index).ok_or(OperationError::OperationFailed)?;
            let matches = if child.prefix().is_empty() {
                child.namespaces().has_uri(uri) || child.uri() == uri
            } else {
                child
                    .namespaces()
                    .uri_for_prefix(child.prefix())
                    .unwrap_or_else(|| child.uri())
                    == uri
            };
            if !matches {
                return Err(OperationError::AnnotationNsNotFound);
            }
        }
        annotation.remove_child(index);
        if annotation.num_children() == 0 {
            debug!("collapsing empty annotation");
            self.annotation = None;
        }
        Ok(())
    }

    /// Replaces the top-level annotation element with the same name as `annotation`.
    ///
    /// The replacement is added at the end rather than in the old position.
    pub fn replace_top_level_annotation_element(&mut self, annotation: &XmlNode) -> OpResult {
        let replacement = if annotation.is_element() && annotation.name() == "annotation" {
            if annotation.num_children() != 1 {
                return Err(OperationError::InvalidObject);
            }
            annotation.child(0).ok_or(OperationError::InvalidObject)?
        } else if annotation.is_fragment() {
            return Err(OperationError::InvalidObject);
        } else {
            annotation
        };
        self.remove_top_level_annotation_element(replacement.name(), None)?;
        self.append_annotation(annotation)
    }

    pub fn replace_top_level_annotation_element_str(&mut self, annotation: &str) -> OpResult {
        let ns = self.namespaces.namespaces().clone();
        self.replace_top_level_annotation_element_str_in(annotation, Some(&ns))
    }

    pub(crate) fn replace_top_level_annotation_element_str_in(
        &mut self,
        annotation: &str,
        namespaces: Option<&XmlNamespaces>,
    ) -> OpResult {
        let node = XmlNode::parse_fragment(annotation, namespaces).ok_or(OperationError::OperationFailed)?;
        self.replace_top_level_annotation_element(&node)
    }

    /// Moves every top-level annotation element whose name repeats an earlier
    /// one into a trailing `duplicateTopLevelElements` wrapper.
    pub fn remove_duplicate_annotations(&mut self) {
        let new = {
            let annotation = match self.annotation.as_ref() {
                Some(a) if a.num_children() > 1 => a,
                _ => return,
            };
            let mut seen: Vec<&str> = Vec::new();
            let mut kept = Vec::new();
            let mut duplicates = Vec::new();
            for c in annotation.children() {
                if c.is_element() && seen.contains(&c.name()) {
                    duplicates.push(c.clone());
                    continue;
                }
                if c.is_element() {
                    seen.push(c.name());
                }
                kept.push(c.clone());
            }
            if duplicates.is_empty() {
                return;
            }
            let mut xmlns = XmlNamespaces::new();
            xmlns.add(DUPLICATE_ANNOTATION_NS, "");
            let mut wrapper = XmlNode::new_element(
                XmlTriple::new("duplicateTopLevelElements", DUPLICATE_ANNOTATION_NS, ""),
                XmlAttributes::new(),
                xmlns,
            );
            *wrapper.children_mut() = duplicates;
            let mut new = XmlNode::new_element(
                annotation.triple().clone(),
                annotation.attributes().clone(),
                annotation.namespaces().clone(),
            );
            *new.children_mut() = kept;
            new.add_child(wrapper);
            new
        };
        self.annotation = Some(new);
    }

    // ---- reading ----

    /// Adds the attributes every element accepts.
    pub(crate) fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        if self.level() > 1 {
            expected.add("metaid");
        }
        expected.add("id");
        expected.add("name");
    }

    /// Checks `attributes` against `expected` and reads the generic ones.
    pub(crate) fn read_attributes(
        &mut self,
        element_name: &str,
        attributes: &XmlAttributes,
        expected: &ExpectedAttributes,
    ) -> Vec<Problem> {
        let mut problems = Vec::new();
        let (level, version) = (self.level(), self.version());
        let unknown = |name: &str| {
            (
                SedErrorCode::SedUnknownCoreAttribute,
                format!(
                    "Attribute '{}' is not part of the definition of a SED-ML Level {} Version {} <{}> element.",
                    name, level, version, element_name
                ),
            )
        };
        for (t, _) in attributes.iter() {
            if !t.prefix.is_empty() {
                if expected.has(&t.prefixed_name()) {
                    continue;
                }
                if element_name == "sedML" {
                    if !expected.has(&t.name) && t.uri != XSI_NS {
                        problems.push(unknown(&t.name));
                    }
                    continue;
                }
            }
            if !expected.has(&t.name) {
                problems.push(unknown(&t.name));
            }
        }

        let empty = |attr: &str| {
            (
                SedErrorCode::SedNotSchemaConformant,
                format!("Attribute '{}' on an <{}> must not be an empty string.", attr, element_name),
            )
        };
        if let Some(id) = attributes.value("id") {
            self.id = id.to_owned();
            if id.is_empty() {
                problems.push(empty("id"));
            } else if !is_valid_sid(id) {
                problems.push((
                    SedErrorCode::SedmlIdSyntaxRule,
                    format!(
                        "The id on the <{}> is '{}', which does not conform to the syntax.",
                        element_name, id
                    ),
                ));
            }
        }
        if let Some(name) = attributes.value("name") {
            self.name = name.to_owned();
            if name.is_empty() {
                problems.push(empty("name"));
            }
        }
        if expected.has("metaid") {
            if let Some(metaid) = attributes.value("metaid") {
                self.metaid = metaid.to_owned();
                if metaid.is_empty() {
                    problems.push(empty("metaid"));
                } else if !is_valid_xml_id(metaid) {
                    problems.push((
                        SedErrorCode::SedInvalidMetaidSyntax,
                        format!("The metaid '{}' does not conform to the syntax.", metaid),
                    ));
                }
            }
        }
        problems
    }

    /// Returns a message if `xmlns` binds `prefix` to a namespace this element can't be in.
    pub(crate) fn default_namespace_problem(
        &self,
        xmlns: &XmlNamespaces,
        element_name: &str,
        prefix: &str,
    ) -> Option<Problem> {
        let uri = xmlns.uri_for_prefix(prefix).unwrap_or("");
        if uri.is_empty() || uri == self.uri {
            return None;
        }
        if is_sed_namespace(uri)
            && !is_sed_namespace(&self.uri)
            && (element_name == "notes" || element_name == "annotation")
        {
            return None;
        }
        Some((
            SedErrorCode::SedNotSchemaConformant,
            format!("xmlns=\"{}\" in <{}> element is an invalid namespace.", uri, element_name),
        ))
    }

    /// Checks a freshly read annotation.
    ///
    /// `document_namespaces` are those declared on the document root, which
    /// may bind prefixes used by top-level elements.
    pub(crate) fn annotation_problems(
        &self,
        element_name: &str,
        document_namespaces: Option<&XmlNamespaces>,
    ) -> Vec<Problem> {
        let mut problems = Vec::new();
        let annotation = match self.annotation.as_ref() {
            Some(a) => a,
            None => return problems,
        };
        problems.extend(self.default_namespace_problem(annotation.namespaces(), "annotation", ""));

        let mut uris: Vec<&str> = Vec::new();
        for top in annotation.children() {
            if !top.is_element() {
                problems.push((SedErrorCode::SedAnnotationNotElement, String::new()));
                continue;
            }
            if !top.uri().is_empty() {
                if uris.contains(&top.uri()) {
                    problems.push((
                        SedErrorCode::SedDuplicateAnnotationNamespaces,
                        format!(
                            "A SED-ML <{}> element has an <annotation> child with multiple children with the same namespace.",
                            element_name
                        ),
                    ));
                }
                uris.push(top.uri());
            }

            let mut implicit = false;
            if top.namespaces().is_empty() {
                implicit = document_namespaces
                    .map_or(false, |ns| ns.index_of_prefix(top.prefix()).is_some());
                if !implicit {
                    problems.push((SedErrorCode::SedMissingAnnotationNamespace, String::new()));
                }
            }
            if top.namespaces().iter().any(|(_, uri)| is_sed_namespace(uri)) {
                problems.push((
                    SedErrorCode::SedNamespaceInAnnotation,
                    format!(
                        "A SED-ML <{}> element uses a restricted namespace on an element in its child <annotation>.",
                        element_name
                    ),
                ));
                break;
            }
            if implicit && top.prefix().is_empty() {
                problems.push((
                    SedErrorCode::SedMissingAnnotationNamespace,
                    format!(
                        "A SED-ML <{}> element assumes the sedml namespace on an element in its child <annotation>.",
                        element_name
                    ),
                ));
            }
        }
        problems
    }

    /// Writes `metaid`, `id` and `name` when set and permitted.
    pub(crate) fn write_attributes(&self, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        if self.level() > 1 && self.is_set_metaid() {
            stream.write_attribute("metaid", "", &self.metaid)?;
        }
        if self.is_set_id() {
            stream.write_attribute("id", "", &self.id)?;
        }
        if self.is_set_name() {
            stream.write_attribute("name", "", &self.name)?;
        }
        Ok(())
    }
}

fn prepend_children(node: &mut XmlNode, mut children: Vec<XmlNode>) {
    children.append(node.children_mut());
    *node.children_mut() = children;
}

fn html_body(html: &XmlNode) -> Option<&XmlNode> {
    let i = html.index_of_child("body")?;
    html.child(i)
}

fn html_body_mut(html: Option<&mut XmlNode>) -> Option<&mut XmlNode> {
    let html = html?;
    let i = html.index_of_child("body")?;
    html.child_mut(i)
}

/// Wraps content in an `<annotation>` element unless it already is one.
fn wrap_annotation(annotation: &XmlNode) -> XmlNode {
    if annotation.is_element() && annotation.name() == "annotation" {
        return annotation.clone();
    }
    let mut wrapper = XmlNode::element("annotation", "", "");
    if annotation.is_fragment() {
        for c in annotation.children() {
            wrapper.add_child(c.clone());
        }
    } else {
        wrapper.add_child(annotation.clone());
    }
    wrapper
}

/// True if the annotation or one of its top-level elements declares a core namespace.
fn declares_sed_namespace(annotation: &XmlNode) -> bool {
    let declares = |n: &XmlNode| n.namespaces().iter().any(|(_, uri)| is_sed_namespace(uri));
    declares(annotation) || annotation.children().iter().any(declares)
}

/// True if the annotation carries an RDF model history or controlled vocabulary terms.
fn has_rdf_payload(annotation: &XmlNode) -> bool {
    let rdf_ns = [DC_NS, DCTERMS_NS, VCARD_NS, BQBIOL_NS, BQMODEL_NS];
    annotation
        .children()
        .iter()
        .filter(|c| c.is_element() && c.name() == "RDF" && (c.uri() == RDF_NS || c.prefix() == "rdf"))
        .flat_map(|rdf| rdf.children())
        .filter(|d| d.is_element() && d.name() == "Description")
        .flat_map(|d| d.children())
        .any(|term| term.is_element() && rdf_ns.contains(&term.uri()))
}
