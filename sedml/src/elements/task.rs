// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{assign_string, log_missing, read_string, unset, write_string};
use crate::base::SedBase;
use crate::error::{OpResult, SedErrorCode};
use crate::object::{impl_object_boilerplate, ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::token::XmlAttributes;

pub(super) fn task_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "task" => Some(Box::new(Task::default())),
        _ => None,
    }
}

/// A `task`: runs a simulation against a model, both named by id.
#[derive(Clone, Debug, Default)]
pub struct Task {
    model_reference: Option<String>,
    simulation_reference: Option<String>,
}

impl Task {
    pub fn model_reference(&self) -> Option<&str> {
        self.model_reference.as_deref()
    }

    pub fn simulation_reference(&self) -> Option<&str> {
        self.simulation_reference.as_deref()
    }
}

impl SedObject for Task {
    fn type_code(&self) -> TypeCode {
        TypeCode::Task
    }

    fn element_name(&self) -> &str {
        "task"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("modelReference");
        expected.add("simulationReference");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        if attributes.value("id").is_none() {
            log_missing(ctx, SedErrorCode::SedmlTaskAllowedAttributes, "id", "Task");
        }
        self.model_reference = read_string(ctx, attributes, "modelReference", "Task");
        self.simulation_reference = read_string(ctx, attributes, "simulationReference", "Task");
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlTaskAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_string(stream, "modelReference", &self.model_reference)?;
        write_string(stream, "simulationReference", &self.simulation_reference)
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

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "modelReference" => self.model_reference.clone(),
            "simulationReference" => self.simulation_reference.clone(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "modelReference" => Some(assign_string(&mut self.model_reference, value)),
            "simulationReference" => Some(assign_string(&mut self.simulation_reference, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "modelReference" => Some(unset(&mut self.model_reference)),
            "simulationReference" => Some(unset(&mut self.simulation_reference)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}
