// SPDX-License-Identifier: MIT OR Apache-2.0

//! Documents written out and read back keep their content.

use sedml::elements::{
    Algorithm, ChangeAttribute, DataGenerator, DataSet, Model, Report, Task, UniformTimeCourse, Variable,
};
use sedml::{
    read_sedml_from_file, read_sedml_from_string, ElementId, SedDocument, SedErrorCode, SedReader, SedWriter,
    XmlNode,
};

fn init() {
    let _ = env_logger::Builder::new().is_test(true).try_init();
}

const ATTRIBUTES: [&str; 17] = [
    "id",
    "name",
    "source",
    "language",
    "target",
    "newValue",
    "kisaoID",
    "initialTime",
    "outputStartTime",
    "outputEndTime",
    "numberOfSteps",
    "modelReference",
    "simulationReference",
    "taskReference",
    "symbol",
    "label",
    "dataReference",
];

const FULL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sedML xmlns="http://sed-ml.org/sed-ml/level1/version4" level="1" version="4">
  <notes><p xmlns="http://www.w3.org/1999/xhtml">An experiment.</p></notes>
  <annotation><tool xmlns="http://example.com/tool" run="3"/></annotation>
  <listOfModels>
    <model id="m1" name="Model one" language="urn:sedml:language:sbml" source="m1.xml">
      <listOfChanges>
        <changeAttribute target="/sbml:sbml/sbml:model/@id" newValue="x"/>
      </listOfChanges>
    </model>
  </listOfModels>
  <listOfSimulations>
    <uniformTimeCourse id="s1" initialTime="0" outputStartTime="0.5" outputEndTime="10" numberOfSteps="100">
      <algorithm kisaoID="KISAO:0000019"/>
    </uniformTimeCourse>
  </listOfSimulations>
  <listOfTasks>
    <task id="t1" modelReference="m1" simulationReference="s1"/>
  </listOfTasks>
  <listOfDataGenerators>
    <dataGenerator id="dg1">
      <listOfVariables>
        <variable id="time" taskReference="t1" symbol="urn:sedml:symbol:time"/>
      </listOfVariables>
      <math xmlns="http://www.w3.org/1998/Math/MathML"><ci>time</ci></math>
    </dataGenerator>
  </listOfDataGenerators>
  <listOfOutputs>
    <report id="r1">
      <listOfDataSets>
        <dataSet id="ds1" label="time" dataReference="dg1"/>
      </listOfDataSets>
    </report>
  </listOfOutputs>
</sedML>
"#;

/// Asserts that the subtrees at `a` and `b` have the same shape and attributes.
fn assert_same(da: &SedDocument, a: ElementId, db: &SedDocument, b: ElementId) {
    assert_eq!(da.element_name(a), db.element_name(b));
    for attr in ATTRIBUTES {
        assert_eq!(
            da.get_attribute(a, attr),
            db.get_attribute(b, attr),
            "{} on <{}>",
            attr,
            da.element_name(a).unwrap_or("?")
        );
    }
    let (ba, bb) = (da.base(a).unwrap(), db.base(b).unwrap());
    assert_eq!(ba.notes_string(), bb.notes_string());
    assert_eq!(ba.annotation_string(), bb.annotation_string());
    let (ca, cb) = (da.children(a), db.children(b));
    assert_eq!(ca.len(), cb.len(), "children of <{}>", da.element_name(a).unwrap_or("?"));
    for (x, y) in ca.into_iter().zip(cb) {
        assert_same(da, x, db, y);
    }
}

#[test]
fn read_write_read() {
    init();
    let first = read_sedml_from_string(FULL);
    assert_eq!(first.num_errors(), 0, "{:?}", first.error_log().errors());
    let xml = SedWriter::new()
        .program_name("round-trip")
        .program_version("1")
        .write_to_string(&first)
        .unwrap();
    let second = read_sedml_from_string(&xml);
    assert_eq!(second.num_errors(), 0, "{:?}\n{}", second.error_log().errors(), &xml);
    assert_eq!((second.level(), second.version()), (1, 4));
    assert_same(&first, first.root(), &second, second.root());

    let dgs = second.list_of_data_generators().unwrap();
    let dg = second.get::<DataGenerator>(second.list_get(dgs, 0).unwrap()).unwrap();
    let math = dg.math().unwrap();
    assert_eq!(math.uri(), "http://www.w3.org/1998/Math/MathML");
    assert_eq!(math.child(0).unwrap().child(0).unwrap().characters(), "time");
}

#[test]
fn unindented_output_is_stable() {
    init();
    let doc = read_sedml_from_string(FULL);
    let writer = SedWriter::new().perform_indent(false);
    let once = writer.write_to_string(&doc).unwrap();
    let twice = writer.write_to_string(&read_sedml_from_string(&once)).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn older_versions_write_number_of_points() {
    init();
    let doc = read_sedml_from_string(
        r#"<sedML xmlns="http://sed-ml.org/sed-ml/level1/version3" level="1" version="3">
  <listOfSimulations>
    <uniformTimeCourse id="s1" initialTime="0" outputStartTime="0" outputEndTime="5" numberOfPoints="50">
      <algorithm kisaoID="KISAO:0000019"/>
    </uniformTimeCourse>
  </listOfSimulations>
</sedML>"#,
    );
    assert_eq!(doc.num_errors(), 0, "{:?}", doc.error_log().errors());
    let xml = SedWriter::new().write_to_string(&doc).unwrap();
    assert!(xml.contains(r#"numberOfPoints="50""#), "{}", &xml);
    assert!(!xml.contains("numberOfSteps"), "{}", &xml);
    assert!(xml.contains(r#"xmlns="http://sed-ml.org/sed-ml/level1/version3""#), "{}", &xml);
}

fn build() -> SedDocument {
    let mut doc = SedDocument::new(1, 4);

    let m = doc.create_element(Box::new(Model::default()));
    doc.set_attribute(m, "id", "m1").unwrap();
    doc.set_attribute(m, "source", "m1.xml").unwrap();
    doc.set_attribute(m, "language", "urn:sedml:language:sbml").unwrap();
    let c = doc.create_element(Box::new(ChangeAttribute::default()));
    doc.set_attribute(c, "target", "/x").unwrap();
    doc.set_attribute(c, "newValue", "2").unwrap();
    let changes = doc.get::<Model>(m).unwrap().list_of_changes().unwrap();
    doc.list_append(changes, c).unwrap();
    let models = doc.list_of_models().unwrap();
    doc.list_append(models, m).unwrap();

    let s = doc.create_element(Box::new(UniformTimeCourse::default()));
    doc.set_attribute(s, "id", "s1").unwrap();
    for (attr, value) in [
        ("initialTime", "0"),
        ("outputStartTime", "0"),
        ("outputEndTime", "20"),
        ("numberOfSteps", "200"),
    ] {
        doc.set_attribute(s, attr, value).unwrap();
    }
    let a = doc.create_element(Box::new(Algorithm::default()));
    doc.get_mut::<Algorithm>(a).unwrap().set_kisao_id("KISAO:0000088").unwrap();
    UniformTimeCourse::set_algorithm(&mut doc, s, a).unwrap();
    let sims = doc.list_of_simulations().unwrap();
    doc.list_append(sims, s).unwrap();

    let t = doc.create_element(Box::new(Task::default()));
    doc.set_attribute(t, "id", "t1").unwrap();
    doc.set_attribute(t, "modelReference", "m1").unwrap();
    doc.set_attribute(t, "simulationReference", "s1").unwrap();
    let tasks = doc.list_of_tasks().unwrap();
    doc.list_append(tasks, t).unwrap();

    let dg = doc.create_element(Box::new(DataGenerator::default()));
    doc.set_attribute(dg, "id", "dg1").unwrap();
    let math = XmlNode::parse_fragment(r#"<math xmlns="http://www.w3.org/1998/Math/MathML"><ci>v</ci></math>"#, None);
    doc.get_mut::<DataGenerator>(dg).unwrap().set_math(math);
    let v = doc.create_element(Box::new(Variable::default()));
    doc.set_attribute(v, "id", "v").unwrap();
    doc.set_attribute(v, "taskReference", "t1").unwrap();
    doc.set_attribute(v, "target", "/sbml:sbml/sbml:model/sbml:listOfSpecies/sbml:species[@id='S1']")
        .unwrap();
    let variables = doc.get::<DataGenerator>(dg).unwrap().list_of_variables().unwrap();
    doc.list_append(variables, v).unwrap();
    let dgs = doc.list_of_data_generators().unwrap();
    doc.list_append(dgs, dg).unwrap();

    let r = doc.create_element(Box::new(Report::default()));
    doc.set_attribute(r, "id", "r1").unwrap();
    let ds = doc.create_element(Box::new(DataSet::default()));
    doc.set_attribute(ds, "id", "ds1").unwrap();
    doc.set_attribute(ds, "label", "S1").unwrap();
    doc.set_attribute(ds, "dataReference", "dg1").unwrap();
    let data_sets = doc.get::<Report>(r).unwrap().list_of_data_sets().unwrap();
    doc.list_append(data_sets, ds).unwrap();
    let outputs = doc.list_of_outputs().unwrap();
    doc.list_append(outputs, r).unwrap();

    let root = doc.root();
    doc.set_notes_str(root, "built in code", true).unwrap();
    doc
}

#[test]
fn built_document() {
    init();
    let doc = build();
    let xml = SedWriter::new().write_to_string(&doc).unwrap();
    let back = SedReader::new().read_from_string(&xml);
    assert_eq!(back.num_errors(), 0, "{:?}\n{}", back.error_log().errors(), &xml);
    assert_same(&doc, doc.root(), &back, back.root());
    assert!(!xml.contains("listOfParameters"), "{}", &xml);
    assert!(xml.contains("KISAO:0000088"), "{}", &xml);
}

#[test]
fn files() {
    init();
    let doc = build();
    let path = std::env::temp_dir().join(format!("sedml-round-trip-{}.sedml", std::process::id()));
    SedWriter::new().write_to_file(&doc, &path).unwrap();
    let back = read_sedml_from_file(&path);
    let _ = std::fs::remove_file(&path);
    assert_eq!(back.num_errors(), 0, "{:?}", back.error_log().errors());
    assert_same(&doc, doc.root(), &back, back.root());
}

#[test]
fn annotated_empty_list_survives() {
    init();
    let mut doc = SedDocument::new(1, 4);
    let tasks = doc.list_of_tasks().unwrap();
    doc.set_annotation_str(tasks, r#"<plan xmlns="http://example.com/plan" later="yes"/>"#)
        .unwrap();
    let xml = SedWriter::new().write_to_string(&doc).unwrap();
    assert!(xml.contains("<listOfTasks>"), "{}", &xml);
    assert!(!xml.contains("listOfModels"), "{}", &xml);

    let back = read_sedml_from_string(&xml);
    assert_eq!(back.error_log().count(SedErrorCode::SedEmptyListElement), 1);
    let tasks = back.list_of_tasks().unwrap();
    let ann = back.base(tasks).unwrap().annotation().unwrap();
    assert_eq!(ann.child(0).unwrap().attributes().value("later"), Some("yes"));
}

#[test]
fn elements_found_and_written_alone() {
    init();
    let doc = read_sedml_from_string(FULL);
    let root = doc.root();
    let t = doc.element_by_sid(root, "t1").unwrap();
    assert_eq!(doc.element_name(t), Some("task"));
    let xml = doc.to_sed_string(t).unwrap();
    assert!(xml.starts_with("<task "), "{}", &xml);
    assert!(xml.contains(r#"simulationReference="s1""#), "{}", &xml);

    let variables: Vec<ElementId> = doc.all_elements(root, |base, _| base.id() == "time");
    assert_eq!(variables.len(), 1);
    assert_eq!(doc.element_name(variables[0]), Some("variable"));
    assert_eq!(doc.element_by_sid(root, "missing"), None);
}
