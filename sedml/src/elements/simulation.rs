// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    assign_number, assign_string, log_missing, read_double, read_integer, read_required_string, unset, write_number,
    write_string,
};
use crate::base::SedBase;
use crate::document::{ElementId, SedDocument};
use crate::error::{OpResult, OperationError, SedErrorCode};
use crate::object::{impl_object_boilerplate, ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::token::{XmlAttributes, XmlToken};

pub(super) fn simulation_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "uniformTimeCourse" => Some(Box::new(UniformTimeCourse::default())),
        _ => None,
    }
}

/// A `uniformTimeCourse` simulation and its `algorithm`.
#[derive(Clone, Debug, Default)]
pub struct UniformTimeCourse {
    initial_time: Option<f64>,
    output_start_time: Option<f64>,
    output_end_time: Option<f64>,
    number_of_steps: Option<i64>,
    algorithm: Option<ElementId>,
}

impl UniformTimeCourse {
    pub fn initial_time(&self) -> Option<f64> {
        self.initial_time
    }

    pub fn output_start_time(&self) -> Option<f64> {
        self.output_start_time
    }

    pub fn output_end_time(&self) -> Option<f64> {
        self.output_end_time
    }

    pub fn number_of_steps(&self) -> Option<i64> {
        self.number_of_steps
    }

    pub fn algorithm(&self) -> Option<ElementId> {
        self.algorithm
    }

    /// Makes the detached [`Algorithm`] element `algorithm` the algorithm of
    /// `simulation`, deleting any previous one.
    pub fn set_algorithm(doc: &mut SedDocument, simulation: ElementId, algorithm: ElementId) -> OpResult {
        if doc.type_code(algorithm) != Some(TypeCode::Algorithm) || doc.parent(algorithm).is_some() {
            return Err(OperationError::OperationFailed);
        }
        doc.check_compatibility(simulation, algorithm)?;
        let old = doc
            .get::<UniformTimeCourse>(simulation)
            .ok_or(OperationError::OperationFailed)?
            .algorithm;
        if let Some(old) = old {
            doc.remove_from_parent(old)?;
        }
        if let Some(s) = doc.get_mut::<UniformTimeCourse>(simulation) {
            s.algorithm = Some(algorithm);
        }
        doc.link(algorithm, Some(simulation));
        Ok(())
    }
}

impl SedObject for UniformTimeCourse {
    fn type_code(&self) -> TypeCode {
        TypeCode::UniformTimeCourse
    }

    fn element_name(&self) -> &str {
        "uniformTimeCourse"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("initialTime");
        expected.add("outputStartTime");
        expected.add("outputEndTime");
        expected.add("numberOfSteps");
        expected.add("numberOfPoints");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        const ELEMENT: &str = "UniformTimeCourse";
        let missing = SedErrorCode::SedmlUniformTimeCourseAllowedAttributes;
        let doubles = [
            ("initialTime", SedErrorCode::SedmlUniformTimeCourseInitialTimeMustBeDouble),
            ("outputStartTime", SedErrorCode::SedmlUniformTimeCourseOutputStartTimeMustBeDouble),
            ("outputEndTime", SedErrorCode::SedmlUniformTimeCourseOutputEndTimeMustBeDouble),
        ];
        if attributes.value("id").is_none() {
            log_missing(ctx, missing, "id", ELEMENT);
        }
        let mut values = [None; 3];
        for (value, (attr, bad_value)) in values.iter_mut().zip(doubles) {
            if attributes.value(attr).is_none() {
                log_missing(ctx, missing, attr, ELEMENT);
            } else {
                *value = read_double(ctx, attributes, attr, ELEMENT, bad_value);
            }
        }
        let [initial, start, end] = values;
        self.initial_time = initial;
        self.output_start_time = start;
        self.output_end_time = end;

        self.number_of_steps = if attributes.value("numberOfSteps").is_some() {
            read_integer(
                ctx,
                attributes,
                "numberOfSteps",
                ELEMENT,
                SedErrorCode::SedmlUniformTimeCourseNumberOfStepsMustBeInteger,
            )
        } else if attributes.value("numberOfPoints").is_some() {
            read_integer(
                ctx,
                attributes,
                "numberOfPoints",
                ELEMENT,
                SedErrorCode::SedmlUniformTimeCourseNumberOfPointsMustBeInteger,
            )
        } else {
            log_missing(ctx, missing, "numberOfSteps", ELEMENT);
            None
        };
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlUniformTimeCourseAllowedAttributes)
    }

    fn write_attributes(&self, ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_number(stream, "initialTime", self.initial_time)?;
        write_number(stream, "outputStartTime", self.output_start_time)?;
        write_number(stream, "outputEndTime", self.output_end_time)?;
        let steps = if ctx.level() == 1 && ctx.version() < 4 {
            "numberOfPoints"
        } else {
            "numberOfSteps"
        };
        write_number(stream, steps, self.number_of_steps)
    }

    fn create_object(&mut self, ctx: &mut ReadContext, token: &XmlToken) -> Option<ElementId> {
        if token.name() != "algorithm" {
            return None;
        }
        if let Some(existing) = self.algorithm {
            ctx.log_error_at(
                SedErrorCode::SedNotSchemaConformant,
                "Only one <algorithm> element is allowed on a <uniformTimeCourse>.",
                token.line(),
                token.column(),
            );
            return Some(existing);
        }
        let id = ctx.create_child(Box::new(Algorithm::default()));
        self.algorithm = Some(id);
        Some(id)
    }

    fn children(&self) -> Vec<ElementId> {
        self.algorithm.into_iter().collect()
    }

    fn remove_child(&mut self, child: ElementId) -> bool {
        if self.algorithm == Some(child) {
            self.algorithm = None;
            return true;
        }
        false
    }

    fn remap_children(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        self.algorithm = self.algorithm.and_then(map);
    }

    fn has_required_attributes(&self, base: &SedBase) -> bool {
        base.is_set_id()
            && self.initial_time.is_some()
            && self.output_start_time.is_some()
            && self.output_end_time.is_some()
            && self.number_of_steps.is_some()
    }

    fn has_required_elements(&self) -> bool {
        self.algorithm.is_some()
    }

    fn id_allowed_pre_v4(&self) -> bool {
        true
    }

    fn name_allowed_pre_v4(&self) -> bool {
        true
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "initialTime" => self.initial_time.map(|v| v.to_string()),
            "outputStartTime" => self.output_start_time.map(|v| v.to_string()),
            "outputEndTime" => self.output_end_time.map(|v| v.to_string()),
            "numberOfSteps" | "numberOfPoints" => self.number_of_steps.map(|v| v.to_string()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "initialTime" => Some(assign_number(&mut self.initial_time, value)),
            "outputStartTime" => Some(assign_number(&mut self.output_start_time, value)),
            "outputEndTime" => Some(assign_number(&mut self.output_end_time, value)),
            "numberOfSteps" | "numberOfPoints" => Some(assign_number(&mut self.number_of_steps, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "initialTime" => Some(unset(&mut self.initial_time)),
            "outputStartTime" => Some(unset(&mut self.output_start_time)),
            "outputEndTime" => Some(unset(&mut self.output_end_time)),
            "numberOfSteps" | "numberOfPoints" => Some(unset(&mut self.number_of_steps)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}

/// An `algorithm`, named by its KiSAO term.
#[derive(Clone, Debug, Default)]
pub struct Algorithm {
    kisao_id: Option<String>,
}

impl Algorithm {
    pub fn kisao_id(&self) -> Option<&str> {
        self.kisao_id.as_deref()
    }

    pub fn set_kisao_id(&mut self, kisao_id: &str) -> OpResult {
        assign_string(&mut self.kisao_id, kisao_id)
    }
}

impl SedObject for Algorithm {
    fn type_code(&self) -> TypeCode {
        TypeCode::Algorithm
    }

    fn element_name(&self) -> &str {
        "algorithm"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("kisaoID");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        self.kisao_id = read_required_string(
            ctx,
            attributes,
            "kisaoID",
            "Algorithm",
            SedErrorCode::SedmlAlgorithmAllowedAttributes,
        );
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlAlgorithmAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_string(stream, "kisaoID", &self.kisao_id)
    }

    fn has_required_attributes(&self, _base: &SedBase) -> bool {
        self.kisao_id.is_some()
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "kisaoID" => self.kisao_id.clone(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "kisaoID" => Some(assign_string(&mut self.kisao_id, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "kisaoID" => Some(unset(&mut self.kisao_id)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}
