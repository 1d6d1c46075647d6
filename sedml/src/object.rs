// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-kind hooks every SED-ML element supplies to the generic read and
//! write engines in [`crate::document`].

use std::any::Any;
use std::fmt::Debug;

use crate::base::SedBase;
use crate::de::XmlInputStream;
use crate::document::{ElementId, SedDocument};
use crate::error::{OpResult, SedErrorCode};
use crate::node::XmlNode;
use crate::ser::{self, XmlOutputStream};
use crate::token::{XmlAttributes, XmlNamespaces, XmlToken};

/// Identifies the concrete kind of an element.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum TypeCode {
    Unknown,
    Document,
    ListOf,
    Model,
    ChangeAttribute,
    UniformTimeCourse,
    Algorithm,
    Task,
    DataGenerator,
    Variable,
    Parameter,
    Report,
    DataSet,
}

impl TypeCode {
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Unknown => "(Unknown SED-ML Type)",
            TypeCode::Document => "Document",
            TypeCode::ListOf => "ListOf",
            TypeCode::Model => "Model",
            TypeCode::ChangeAttribute => "ChangeAttribute",
            TypeCode::UniformTimeCourse => "UniformTimeCourse",
            TypeCode::Algorithm => "Algorithm",
            TypeCode::Task => "Task",
            TypeCode::DataGenerator => "DataGenerator",
            TypeCode::Variable => "Variable",
            TypeCode::Parameter => "Parameter",
            TypeCode::Report => "Report",
            TypeCode::DataSet => "DataSet",
        }
    }
}

/// The attribute names an element accepts, gathered before its attributes are read.
#[derive(Clone, Debug, Default)]
pub struct ExpectedAttributes(Vec<String>);

impl ExpectedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str) {
        if !self.has(name) {
            self.0.push(name.to_owned());
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

/// Hooks a concrete element kind supplies to the generic engines.
///
/// State shared by all kinds (identifiers, notes, annotation) lives in the
/// element's [`SedBase`]; implementations hold only their own attributes and
/// the handles of their children. Every hook has a do-nothing default except
/// the identity and cloning methods.
pub trait SedObject: Debug {
    fn type_code(&self) -> TypeCode;

    /// The XML tag, e.g. `model`.
    fn element_name(&self) -> &str;

    fn add_expected_attributes(&self, _expected: &mut ExpectedAttributes) {}

    /// Reads this kind's own attributes. Generic ones have already been read.
    fn read_attributes(&mut self, _ctx: &mut ReadContext, _attributes: &XmlAttributes) {}

    /// Code unknown attributes on this element are reported under, if more
    /// specific than [`SedErrorCode::SedUnknownCoreAttribute`].
    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        None
    }

    /// Writes this kind's own attributes. Generic ones have already been written.
    fn write_attributes(&self, _ctx: &WriteContext, _stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        Ok(())
    }

    /// Writes namespace declarations on the start tag.
    fn write_xmlns(&self, _ctx: &WriteContext, _stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        Ok(())
    }

    /// Creates (and records) the child for the start tag `token`, if it is one this kind holds.
    fn create_object(&mut self, _ctx: &mut ReadContext, _token: &XmlToken) -> Option<ElementId> {
        None
    }

    /// Called once when the element enters an arena, to create the list
    /// containers it always owns. `make` stores a list and returns its handle.
    fn create_lists(&mut self, _make: &mut dyn FnMut(crate::list_of::SedListOf) -> ElementId) {}

    /// Reads foreign markup such as MathML from the stream, returning true if consumed.
    fn read_other_xml(&mut self, _ctx: &mut ReadContext, _stream: &mut XmlInputStream) -> bool {
        false
    }

    /// Foreign markup written after the children.
    fn other_xml(&self) -> Vec<&XmlNode> {
        Vec::new()
    }

    /// Receives text content found directly inside the element.
    fn set_element_text(&mut self, _text: &str) {}

    /// Child elements in write order.
    fn children(&self) -> Vec<ElementId> {
        Vec::new()
    }

    /// Forgets `child`, returning true if it was held.
    fn remove_child(&mut self, _child: ElementId) -> bool {
        false
    }

    /// Rewrites child handles after the subtree was copied into new slots.
    fn remap_children(&mut self, _map: &dyn Fn(ElementId) -> Option<ElementId>) {}

    /// Ordinal among the parent's child elements, or -1 if unordered.
    fn element_position(&self) -> i32 {
        -1
    }

    /// True if every required attribute is set. Generic attributes are in `base`.
    fn has_required_attributes(&self, _base: &SedBase) -> bool {
        true
    }

    fn has_required_elements(&self) -> bool {
        true
    }

    /// If `id` may be used before Level 1 Version 4.
    fn id_allowed_pre_v4(&self) -> bool {
        false
    }

    fn name_allowed_pre_v4(&self) -> bool {
        false
    }

    /// Value of this kind's attribute `name`, or `None` if unset or unknown.
    fn get_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    /// Sets this kind's attribute `name`; `None` if it has no such attribute.
    fn set_attribute(&mut self, _name: &str, _value: &str) -> Option<OpResult> {
        None
    }

    fn unset_attribute(&mut self, _name: &str) -> Option<OpResult> {
        None
    }

    fn clone_object(&self) -> Box<dyn SedObject>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What a hook may touch while its element is being read.
///
/// The element's own object is detached from the arena for the duration of
/// its hooks; everything else, including its [`SedBase`], is reachable here.
pub struct ReadContext<'a> {
    pub(crate) doc: &'a mut SedDocument,
    pub(crate) id: ElementId,
}

impl<'a> ReadContext<'a> {
    /// Handle of the element being read.
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn level(&self) -> u32 {
        self.doc.level()
    }

    pub fn version(&self) -> u32 {
        self.doc.version()
    }

    pub fn base(&self) -> Option<&SedBase> {
        self.doc.base(self.id)
    }

    pub fn base_mut(&mut self) -> Option<&mut SedBase> {
        self.doc.base_mut(self.id)
    }

    pub fn document(&self) -> &SedDocument {
        &*self.doc
    }

    /// Namespaces declared on the document root.
    pub fn document_namespaces(&self) -> XmlNamespaces {
        self.doc.namespaces().namespaces().clone()
    }

    /// Logs against the element's start tag position.
    pub fn log_error(&mut self, code: SedErrorCode, message: &str) {
        let (line, column) = self
            .doc
            .base(self.id)
            .map_or((0, 0), |b| (b.line(), b.column()));
        self.log_error_at(code, message, line, column);
    }

    pub fn log_error_at(&mut self, code: SedErrorCode, message: &str, line: u32, column: u32) {
        let (level, version) = (self.level(), self.version());
        self.doc.error_log_mut().log(code, level, version, message, line, column);
    }

    pub fn num_errors(&self) -> usize {
        self.doc.error_log().num_errors()
    }

    /// Stores `object` as a new element owned by the element being read.
    pub fn create_child(&mut self, object: Box<dyn SedObject>) -> ElementId {
        let child = self.doc.create_element(object);
        self.doc.link(child, Some(self.id));
        child
    }

    /// Element kind behind `id`, for elements other than the one being read.
    pub fn type_code_of(&self, id: ElementId) -> Option<TypeCode> {
        self.doc.type_code(id)
    }

    pub(crate) fn set_level_version(&mut self, level: u32, version: u32) {
        self.doc.set_level_version_unchecked(level, version);
    }
}

/// What a hook may see while its element is being written.
pub struct WriteContext<'a> {
    pub(crate) doc: &'a SedDocument,
    pub(crate) id: ElementId,
}

impl<'a> WriteContext<'a> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn level(&self) -> u32 {
        self.doc.level()
    }

    pub fn version(&self) -> u32 {
        self.doc.version()
    }

    pub fn document(&self) -> &SedDocument {
        self.doc
    }
}

/// Implements the boilerplate [`SedObject`] methods for a `Clone` type.
macro_rules! impl_object_boilerplate {
    () => {
        fn clone_object(&self) -> Box<dyn $crate::object::SedObject> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
pub(crate) use impl_object_boilerplate;
