// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{assign_string, log_missing, read_required_string, read_string, unset, write_string};
use crate::base::SedBase;
use crate::document::ElementId;
use crate::error::{OpResult, SedErrorCode};
use crate::list_of::SedListOf;
use crate::object::{impl_object_boilerplate, ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::token::{XmlAttributes, XmlToken};

pub(super) fn model_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "model" => Some(Box::new(Model::default())),
        _ => None,
    }
}

fn change_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "changeAttribute" => Some(Box::new(ChangeAttribute::default())),
        _ => None,
    }
}

/// A `model`: the source of a model and the changes applied before simulating it.
#[derive(Clone, Debug, Default)]
pub struct Model {
    language: Option<String>,
    source: Option<String>,
    changes: Option<ElementId>,
}

impl Model {
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, language: &str) -> OpResult {
        assign_string(&mut self.language, language)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: &str) -> OpResult {
        assign_string(&mut self.source, source)
    }

    /// The `listOfChanges` container.
    pub fn list_of_changes(&self) -> Option<ElementId> {
        self.changes
    }
}

impl SedObject for Model {
    fn type_code(&self) -> TypeCode {
        TypeCode::Model
    }

    fn element_name(&self) -> &str {
        "model"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("language");
        expected.add("source");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        if attributes.value("id").is_none() {
            log_missing(ctx, SedErrorCode::SedmlModelAllowedAttributes, "id", "Model");
        }
        self.language = if ctx.level() > 1 || ctx.version() >= 4 {
            read_required_string(ctx, attributes, "language", "Model", SedErrorCode::SedmlModelAllowedAttributes)
        } else {
            read_string(ctx, attributes, "language", "Model")
        };
        self.source =
            read_required_string(ctx, attributes, "source", "Model", SedErrorCode::SedmlModelAllowedAttributes);
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlModelAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_string(stream, "language", &self.language)?;
        write_string(stream, "source", &self.source)
    }

    fn create_lists(&mut self, make: &mut dyn FnMut(SedListOf) -> ElementId) {
        self.changes = Some(make(
            SedListOf::new("listOfChanges", change_item)
                .with_position(1)
                .with_attributes_code(SedErrorCode::SedmlModelLoChangesAllowedCoreAttributes),
        ));
    }

    fn create_object(&mut self, _ctx: &mut ReadContext, token: &XmlToken) -> Option<ElementId> {
        match token.name() {
            "listOfChanges" => self.changes,
            _ => None,
        }
    }

    fn children(&self) -> Vec<ElementId> {
        self.changes.into_iter().collect()
    }

    fn remove_child(&mut self, child: ElementId) -> bool {
        if self.changes == Some(child) {
            self.changes = None;
            return true;
        }
        false
    }

    fn remap_children(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        self.changes = self.changes.and_then(map);
    }

    fn has_required_attributes(&self, base: &SedBase) -> bool {
        base.is_set_id() && self.source.is_some() && (base.version() < 4 || self.language.is_some())
    }

    fn id_allowed_pre_v4(&self) -> bool {
        true
    }

    fn name_allowed_pre_v4(&self) -> bool {
        true
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "language" => self.language.clone(),
            "source" => self.source.clone(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "language" => Some(assign_string(&mut self.language, value)),
            "source" => Some(assign_string(&mut self.source, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "language" => Some(unset(&mut self.language)),
            "source" => Some(unset(&mut self.source)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}

/// A `changeAttribute`: sets the model attribute at `target` to `newValue`.
#[derive(Clone, Debug, Default)]
pub struct ChangeAttribute {
    target: Option<String>,
    new_value: Option<String>,
}

impl ChangeAttribute {
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }
}

impl SedObject for ChangeAttribute {
    fn type_code(&self) -> TypeCode {
        TypeCode::ChangeAttribute
    }

    fn element_name(&self) -> &str {
        "changeAttribute"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("target");
        expected.add("newValue");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        let code = SedErrorCode::SedmlChangeAttributeAllowedAttributes;
        self.target = read_required_string(ctx, attributes, "target", "ChangeAttribute", code);
        self.new_value = read_required_string(ctx, attributes, "newValue", "ChangeAttribute", code);
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlChangeAttributeAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_string(stream, "target", &self.target)?;
        write_string(stream, "newValue", &self.new_value)
    }

    fn has_required_attributes(&self, _base: &SedBase) -> bool {
        self.target.is_some() && self.new_value.is_some()
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "target" => self.target.clone(),
            "newValue" => self.new_value.clone(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "target" => Some(assign_string(&mut self.target, value)),
            "newValue" => Some(assign_string(&mut self.new_value, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "target" => Some(unset(&mut self.target)),
            "newValue" => Some(unset(&mut self.new_value)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}
