// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{assign_string, log_missing, read_required_string, unset, write_string};
use crate::base::SedBase;
use crate::document::ElementId;
use crate::error::{OpResult, SedErrorCode};
use crate::list_of::SedListOf;
use crate::object::{impl_object_boilerplate, ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::token::{XmlAttributes, XmlToken};

pub(super) fn output_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "report" => Some(Box::new(Report::default())),
        _ => None,
    }
}

fn data_set_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "dataSet" => Some(Box::new(DataSet::default())),
        _ => None,
    }
}

/// A `report`: a table of data sets.
#[derive(Clone, Debug, Default)]
pub struct Report {
    data_sets: Option<ElementId>,
}

impl Report {
    pub fn list_of_data_sets(&self) -> Option<ElementId> {
        self.data_sets
    }
}

impl SedObject for Report {
    fn type_code(&self) -> TypeCode {
        TypeCode::Report
    }

    fn element_name(&self) -> &str {
        "report"
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        if attributes.value("id").is_none() {
            log_missing(ctx, SedErrorCode::SedmlOutputAllowedAttributes, "id", "Report");
        }
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlOutputAllowedAttributes)
    }

    fn create_lists(&mut self, make: &mut dyn FnMut(SedListOf) -> ElementId) {
        self.data_sets = Some(make(
            SedListOf::new("listOfDataSets", data_set_item)
                .with_position(1)
                .with_attributes_code(SedErrorCode::SedmlReportLoDataSetsAllowedCoreAttributes),
        ));
    }

    fn create_object(&mut self, _ctx: &mut ReadContext, token: &XmlToken) -> Option<ElementId> {
        match token.name() {
            "listOfDataSets" => self.data_sets,
            _ => None,
        }
    }

    fn children(&self) -> Vec<ElementId> {
        self.data_sets.into_iter().collect()
    }

    fn remove_child(&mut self, child: ElementId) -> bool {
        if self.data_sets == Some(child) {
            self.data_sets = None;
            return true;
        }
        false
    }

    fn remap_children(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        self.data_sets = self.data_sets.and_then(map);
    }

    fn has_required_attributes(&self, base: &SedBase) -> bool {
        base.is_set_id()
    }

    fn id_allowed_pre_v4(&self) -> bool {
        true
    }

    fn name_allowed_pre_v4(&self) -> bool {
        true
    }

    impl_object_boilerplate!();
}

/// A `dataSet`: one labelled column of a report.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    label: Option<String>,
    data_reference: Option<String>,
}

impl DataSet {
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn data_reference(&self) -> Option<&str> {
        self.data_reference.as_deref()
    }
}

impl SedObject for DataSet {
    fn type_code(&self) -> TypeCode {
        TypeCode::DataSet
    }

    fn element_name(&self) -> &str {
        "dataSet"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("label");
        expected.add("dataReference");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        let code = SedErrorCode::SedmlDataSetAllowedAttributes;
        if attributes.value("id").is_none() {
            log_missing(ctx, code, "id", "DataSet");
        }
        self.label = read_required_string(ctx, attributes, "label", "DataSet", code);
        self.data_reference = read_required_string(ctx, attributes, "dataReference", "DataSet", code);
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlDataSetAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_string(stream, "label", &self.label)?;
        write_string(stream, "dataReference", &self.data_reference)
    }

    fn has_required_attributes(&self, base: &SedBase) -> bool {
        base.is_set_id() && self.label.is_some() && self.data_reference.is_some()
    }

    fn id_allowed_pre_v4(&self) -> bool {
        true
    }

    fn name_allowed_pre_v4(&self) -> bool {
        true
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "label" => self.label.clone(),
            "dataReference" => self.data_reference.clone(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "label" => Some(assign_string(&mut self.label, value)),
            "dataReference" => Some(assign_string(&mut self.data_reference, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "label" => Some(unset(&mut self.label)),
            "dataReference" => Some(unset(&mut self.data_reference)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}
