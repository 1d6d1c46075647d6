// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    assign_number, assign_string, log_missing, read_double, read_string, unset, write_number, write_string,
};
use crate::base::SedBase;
use crate::de::XmlInputStream;
use crate::document::ElementId;
use crate::error::{OpResult, SedErrorCode};
use crate::list_of::SedListOf;
use crate::node::XmlNode;
use crate::object::{impl_object_boilerplate, ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::token::{XmlAttributes, XmlToken};

pub(super) fn data_generator_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "dataGenerator" => Some(Box::new(DataGenerator::default())),
        _ => None,
    }
}

fn variable_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "variable" => Some(Box::new(Variable::default())),
        _ => None,
    }
}

fn parameter_item(name: &str) -> Option<Box<dyn SedObject>> {
    match name {
        "parameter" => Some(Box::new(Parameter::default())),
        _ => None,
    }
}

/// A `dataGenerator`: a MathML expression over variables and parameters.
#[derive(Clone, Debug, Default)]
pub struct DataGenerator {
    variables: Option<ElementId>,
    parameters: Option<ElementId>,
    math: Option<XmlNode>,
}

impl DataGenerator {
    pub fn list_of_variables(&self) -> Option<ElementId> {
        self.variables
    }

    pub fn list_of_parameters(&self) -> Option<ElementId> {
        self.parameters
    }

    /// The `math` element, kept as an uninterpreted tree.
    pub fn math(&self) -> Option<&XmlNode> {
        self.math.as_ref()
    }

    pub fn set_math(&mut self, math: Option<XmlNode>) {
        self.math = math;
    }
}

impl SedObject for DataGenerator {
    fn type_code(&self) -> TypeCode {
        TypeCode::DataGenerator
    }

    fn element_name(&self) -> &str {
        "dataGenerator"
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        if attributes.value("id").is_none() {
            log_missing(ctx, SedErrorCode::SedmlDataGeneratorAllowedAttributes, "id", "DataGenerator");
        }
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlDataGeneratorAllowedAttributes)
    }

    fn create_lists(&mut self, make: &mut dyn FnMut(SedListOf) -> ElementId) {
        self.variables = Some(make(
            SedListOf::new("listOfVariables", variable_item)
                .with_position(1)
                .with_attributes_code(SedErrorCode::SedmlDataGeneratorLoVariablesAllowedCoreAttributes),
        ));
        self.parameters = Some(make(
            SedListOf::new("listOfParameters", parameter_item)
                .with_position(2)
                .with_attributes_code(SedErrorCode::SedmlDataGeneratorLoParametersAllowedCoreAttributes),
        ));
    }

    fn create_object(&mut self, _ctx: &mut ReadContext, token: &XmlToken) -> Option<ElementId> {
        match token.name() {
            "listOfVariables" => self.variables,
            "listOfParameters" => self.parameters,
            _ => None,
        }
    }

    fn read_other_xml(&mut self, ctx: &mut ReadContext, stream: &mut XmlInputStream) -> bool {
        let (line, column) = {
            let next = stream.peek();
            if next.name() != "math" {
                return false;
            }
            (next.line(), next.column())
        };
        if self.math.is_some() {
            ctx.log_error_at(
                SedErrorCode::SedNotSchemaConformant,
                "Only one <math> element is allowed on a <dataGenerator>.",
                line,
                column,
            );
        }
        if let Some(math) = XmlNode::from_stream(stream) {
            self.math = Some(math);
        }
        true
    }

    fn other_xml(&self) -> Vec<&XmlNode> {
        self.math.iter().collect()
    }

    fn children(&self) -> Vec<ElementId> {
        [self.variables, self.parameters].iter().flatten().copied().collect()
    }

    fn remove_child(&mut self, child: ElementId) -> bool {
        for l in [&mut self.variables, &mut self.parameters] {
            if *l == Some(child) {
                *l = None;
                return true;
            }
        }
        false
    }

    fn remap_children(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        self.variables = self.variables.and_then(map);
        self.parameters = self.parameters.and_then(map);
    }

    fn has_required_attributes(&self, base: &SedBase) -> bool {
        base.is_set_id()
    }

    fn has_required_elements(&self) -> bool {
        self.math.is_some()
    }

    fn id_allowed_pre_v4(&self) -> bool {
        true
    }

    fn name_allowed_pre_v4(&self) -> bool {
        true
    }

    impl_object_boilerplate!();
}

/// A `variable`: a quantity taken from a model or a task's results.
#[derive(Clone, Debug, Default)]
pub struct Variable {
    target: Option<String>,
    symbol: Option<String>,
    task_reference: Option<String>,
    model_reference: Option<String>,
}

impl Variable {
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn task_reference(&self) -> Option<&str> {
        self.task_reference.as_deref()
    }

    pub fn model_reference(&self) -> Option<&str> {
        self.model_reference.as_deref()
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "target" => Some(&mut self.target),
            "symbol" => Some(&mut self.symbol),
            "taskReference" => Some(&mut self.task_reference),
            "modelReference" => Some(&mut self.model_reference),
            _ => None,
        }
    }
}

const VARIABLE_ATTRIBUTES: [&str; 4] = ["target", "symbol", "taskReference", "modelReference"];

impl SedObject for Variable {
    fn type_code(&self) -> TypeCode {
        TypeCode::Variable
    }

    fn element_name(&self) -> &str {
        "variable"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        for a in VARIABLE_ATTRIBUTES {
            expected.add(a);
        }
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        if attributes.value("id").is_none() {
            log_missing(ctx, SedErrorCode::SedmlVariableAllowedAttributes, "id", "Variable");
        }
        for a in VARIABLE_ATTRIBUTES {
            let v = read_string(ctx, attributes, a, "Variable");
            if let Some(f) = self.field_mut(a) {
                *f = v;
            }
        }
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlVariableAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_string(stream, "target", &self.target)?;
        write_string(stream, "symbol", &self.symbol)?;
        write_string(stream, "taskReference", &self.task_reference)?;
        write_string(stream, "modelReference", &self.model_reference)
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
            "target" => self.target.clone(),
            "symbol" => self.symbol.clone(),
            "taskReference" => self.task_reference.clone(),
            "modelReference" => self.model_reference.clone(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        self.field_mut(name).map(|f| assign_string(f, value))
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        self.field_mut(name).map(unset)
    }

    impl_object_boilerplate!();
}

/// A `parameter`: a named constant used by a data generator's math.
#[derive(Clone, Debug, Default)]
pub struct Parameter {
    value: Option<f64>,
}

impl Parameter {
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = Some(value);
    }
}

impl SedObject for Parameter {
    fn type_code(&self) -> TypeCode {
        TypeCode::Parameter
    }

    fn element_name(&self) -> &str {
        "parameter"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("value");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        let code = SedErrorCode::SedmlParameterAllowedAttributes;
        if attributes.value("id").is_none() {
            log_missing(ctx, code, "id", "Parameter");
        }
        if attributes.value("value").is_none() {
            log_missing(ctx, code, "value", "Parameter");
            return;
        }
        self.value = read_double(
            ctx,
            attributes,
            "value",
            "Parameter",
            SedErrorCode::SedmlParameterValueMustBeDouble,
        );
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlParameterAllowedAttributes)
    }

    fn write_attributes(&self, _ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        write_number(stream, "value", self.value)
    }

    fn has_required_attributes(&self, base: &SedBase) -> bool {
        base.is_set_id() && self.value.is_some()
    }

    fn id_allowed_pre_v4(&self) -> bool {
        true
    }

    fn name_allowed_pre_v4(&self) -> bool {
        true
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        match name {
            "value" => self.value.map(|v| v.to_string()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Option<OpResult> {
        match name {
            "value" => Some(assign_number(&mut self.value, value)),
            _ => None,
        }
    }

    fn unset_attribute(&mut self, name: &str) -> Option<OpResult> {
        match name {
            "value" => Some(unset(&mut self.value)),
            _ => None,
        }
    }

    impl_object_boilerplate!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SedDocument;

    #[test]
    fn math_is_required() {
        let mut doc = SedDocument::new(1, 4);
        let dgs = doc.list_of_data_generators().unwrap();
        let dg = doc.create_element(Box::new(DataGenerator::default()));
        doc.set_attribute(dg, "id", "dg1").unwrap();
        assert!(doc.list_append(dgs, dg).is_err());

        let math = XmlNode::parse_fragment(
            "<math xmlns=\"http://www.w3.org/1998/Math/MathML\"><ci>v</ci></math>",
            None,
        )
        .unwrap();
        doc.get_mut::<DataGenerator>(dg).unwrap().set_math(Some(math));
        doc.list_append(dgs, dg).unwrap();

        let vars = doc.get::<DataGenerator>(dg).unwrap().list_of_variables().unwrap();
        let v = doc.create_element(Box::new(Variable::default()));
        doc.set_attribute(v, "id", "v").unwrap();
        doc.set_attribute(v, "taskReference", "t1").unwrap();
        doc.list_append(vars, v).unwrap();
        assert_eq!(doc.ancestor_of_type(v, TypeCode::DataGenerator), Some(dg));
        assert_eq!(doc.get::<Variable>(v).unwrap().task_reference(), Some("t1"));
        assert!(doc.unset_attribute(v, "symbol").is_ok());
    }
}
