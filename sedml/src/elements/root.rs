// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{data_generator, log_missing, model, output, read_number, simulation, task};
use crate::document::ElementId;
use crate::error::SedErrorCode;
use crate::list_of::SedListOf;
use crate::namespaces::is_sed_namespace;
use crate::object::{impl_object_boilerplate, ExpectedAttributes, ReadContext, SedObject, TypeCode, WriteContext};
use crate::ser::{self, XmlOutputStream};
use crate::token::{XmlAttributes, XmlToken};

/// The `sedML` root element: its `level`/`version` and the five top-level lists.
#[derive(Clone, Debug, Default)]
pub struct DocumentElement {
    pub(crate) models: Option<ElementId>,
    pub(crate) simulations: Option<ElementId>,
    pub(crate) tasks: Option<ElementId>,
    pub(crate) data_generators: Option<ElementId>,
    pub(crate) outputs: Option<ElementId>,
}

impl DocumentElement {
    fn lists(&self) -> [Option<ElementId>; 5] {
        [
            self.models,
            self.simulations,
            self.tasks,
            self.data_generators,
            self.outputs,
        ]
    }
}

impl SedObject for DocumentElement {
    fn type_code(&self) -> TypeCode {
        TypeCode::Document
    }

    fn element_name(&self) -> &str {
        "sedML"
    }

    fn add_expected_attributes(&self, expected: &mut ExpectedAttributes) {
        expected.add("level");
        expected.add("version");
    }

    fn read_attributes(&mut self, ctx: &mut ReadContext, attributes: &XmlAttributes) {
        let mut level_version = [None, None];
        let checks = [
            ("level", SedErrorCode::SedmlDocumentLevelMustBeNonNegativeInteger),
            ("version", SedErrorCode::SedmlDocumentVersionMustBeNonNegativeInteger),
        ];
        for (slot, (attr, bad_value)) in level_version.iter_mut().zip(checks) {
            if attributes.value(attr).is_none() {
                log_missing(ctx, SedErrorCode::SedmlDocumentAllowedAttributes, attr, "SedDocument");
                continue;
            }
            *slot = read_number::<u32>(ctx, attributes, attr, "SedDocument", "an integer", bad_value);
        }
        if let [Some(level), Some(version)] = level_version {
            ctx.set_level_version(level, version);
        }
    }

    fn allowed_attributes_code(&self) -> Option<SedErrorCode> {
        Some(SedErrorCode::SedmlDocumentAllowedAttributes)
    }

    fn write_xmlns(&self, ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        let doc = ctx.document();
        let ns = doc.namespaces();
        let mut has_core = false;
        for (prefix, uri) in ns.namespaces().iter() {
            has_core |= is_sed_namespace(uri);
            stream.write_namespace(uri, prefix)?;
        }
        if !has_core {
            stream.write_namespace(ns.uri(), doc.core_prefix())?;
        }
        Ok(())
    }

    fn write_attributes(&self, ctx: &WriteContext, stream: &mut XmlOutputStream) -> Result<(), ser::Error> {
        stream.write_attribute("level", "", &ctx.level().to_string())?;
        stream.write_attribute("version", "", &ctx.version().to_string())
    }

    fn create_lists(&mut self, make: &mut dyn FnMut(SedListOf) -> ElementId) {
        self.models = Some(make(
            SedListOf::new("listOfModels", model::model_item)
                .with_position(1)
                .with_attributes_code(SedErrorCode::SedmlDocumentLoModelsAllowedCoreAttributes),
        ));
        self.simulations = Some(make(
            SedListOf::new("listOfSimulations", simulation::simulation_item)
                .with_position(2)
                .with_attributes_code(SedErrorCode::SedmlDocumentLoSimulationsAllowedCoreAttributes),
        ));
        self.tasks = Some(make(
            SedListOf::new("listOfTasks", task::task_item)
                .with_position(3)
                .with_attributes_code(SedErrorCode::SedmlDocumentLoTasksAllowedCoreAttributes),
        ));
        self.data_generators = Some(make(
            SedListOf::new("listOfDataGenerators", data_generator::data_generator_item)
                .with_position(4)
                .with_attributes_code(SedErrorCode::SedmlDocumentLoDataGeneratorsAllowedCoreAttributes),
        ));
        self.outputs = Some(make(
            SedListOf::new("listOfOutputs", output::output_item)
                .with_position(5)
                .with_attributes_code(SedErrorCode::SedmlDocumentLoOutputsAllowedCoreAttributes),
        ));
    }

    fn create_object(&mut self, ctx: &mut ReadContext, token: &XmlToken) -> Option<ElementId> {
        let list = match token.name() {
            "listOfModels" => self.models,
            "listOfSimulations" => self.simulations,
            "listOfTasks" => self.tasks,
            "listOfDataGenerators" => self.data_generators,
            "listOfOutputs" => self.outputs,
            _ => return None,
        }?;
        if ctx.document().list_len(list) != 0 {
            ctx.log_error_at(
                SedErrorCode::SedmlDocumentAllowedElements,
                &format!("The <sedML> element may contain only one <{}> element.", token.name()),
                token.line(),
                token.column(),
            );
        }
        Some(list)
    }

    fn children(&self) -> Vec<ElementId> {
        self.lists().iter().flatten().copied().collect()
    }

    fn remove_child(&mut self, child: ElementId) -> bool {
        for l in [
            &mut self.models,
            &mut self.simulations,
            &mut self.tasks,
            &mut self.data_generators,
            &mut self.outputs,
        ] {
            if *l == Some(child) {
                *l = None;
                return true;
            }
        }
        false
    }

    fn remap_children(&mut self, map: &dyn Fn(ElementId) -> Option<ElementId>) {
        for l in [
            &mut self.models,
            &mut self.simulations,
            &mut self.tasks,
            &mut self.data_generators,
            &mut self.outputs,
        ] {
            *l = l.and_then(map);
        }
    }

    impl_object_boilerplate!();
}
