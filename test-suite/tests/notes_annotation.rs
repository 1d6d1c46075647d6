// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notes and annotation editing through the document.

use assert_matches::assert_matches;
use sedml::elements::Model;
use sedml::{read_sedml_from_string, write_sedml_to_string, OperationError, SedDocument, SedErrorCode, XmlNode};

fn init() {
    let _ = env_logger::Builder::new().is_test(true).try_init();
}

const RDF: &str = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                               xmlns:bqbiol="http://biomodels.net/biology-qualifiers/">
  <rdf:Description rdf:about="#m1">
    <bqbiol:is><rdf:Bag><rdf:li rdf:resource="urn:miriam:x"/></rdf:Bag></bqbiol:is>
  </rdf:Description>
</rdf:RDF>"##;

fn model(doc: &mut SedDocument) -> sedml::ElementId {
    let m = doc.create_element(Box::new(Model::default()));
    doc.set_attribute(m, "id", "m1").unwrap();
    doc.set_attribute(m, "source", "m1.xml").unwrap();
    m
}

#[test]
fn plain_paragraphs_append() {
    init();
    let mut doc = SedDocument::new(1, 3);
    let m = model(&mut doc);
    doc.set_notes_str(m, "<p>hi</p>", false).unwrap();
    doc.append_notes_str(m, "<p>bye</p>").unwrap();
    assert_eq!(doc.base(m).unwrap().notes_string(), "<notes><p>hi</p><p>bye</p></notes>");

    // Appending nothing changes nothing.
    doc.append_notes_str(m, "").unwrap();
    assert_eq!(doc.base(m).unwrap().notes().unwrap().num_children(), 2);
}

#[test]
fn malformed_notes_rejected() {
    init();
    let mut doc = SedDocument::new(1, 4);
    let root = doc.root();
    assert_eq!(doc.set_notes_str(root, "<p>unclosed", false), Err(OperationError::OperationFailed));
    assert!(!doc.base(root).unwrap().is_set_notes());
}

#[test]
fn rdf_needs_metaid() {
    init();
    let mut doc = SedDocument::new(1, 4);
    let root = doc.root();
    assert_eq!(doc.set_annotation_str(root, RDF), Err(OperationError::UnexpectedAttribute));
    assert!(!doc.base(root).unwrap().is_set_annotation());

    // Annotations without RDF terms need no metaid.
    doc.set_annotation_str(root, r#"<tool xmlns="http://example.com/tool" run="1"/>"#)
        .unwrap();
    assert!(doc.base(root).unwrap().is_set_annotation());
}

#[test]
fn append_skips_repeated_names() {
    init();
    let mut doc = SedDocument::new(1, 4);
    let m = model(&mut doc);
    doc.append_annotation_str(m, r#"<a xmlns="http://example.com/a"/>"#).unwrap();
    assert_matches!(
        doc.append_annotation_str(
            m,
            r#"<a xmlns="http://example.com/a" v="2"/><b xmlns="http://example.com/b"/>"#
        ),
        Err(OperationError::DuplicateAnnotationNs)
    );
    let names: Vec<String> = doc
        .base(m)
        .unwrap()
        .annotation()
        .unwrap()
        .children()
        .iter()
        .map(|c| c.name().to_owned())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn replace_moves_to_end() {
    init();
    let mut doc = SedDocument::new(1, 4);
    let m = model(&mut doc);
    doc.set_annotation_str(m, r#"<a xmlns="http://example.com/a"/><b xmlns="http://example.com/b"/>"#)
        .unwrap();
    doc.replace_top_level_annotation_element_str(m, r#"<a xmlns="http://example.com/a" v="2"/>"#)
        .unwrap();
    let base = doc.base(m).unwrap();
    let ann = base.annotation().unwrap();
    assert_eq!(ann.child(0).unwrap().name(), "b");
    assert_eq!(ann.child(1).unwrap().attributes().value("v"), Some("2"));

    assert_eq!(
        doc.replace_top_level_annotation_element_str(m, r#"<c xmlns="http://example.com/c"/>"#),
        Err(OperationError::AnnotationNameNotFound)
    );
}

#[test]
fn duplicates_read_then_collected() {
    init();
    let mut doc = read_sedml_from_string(
        r#"<sedML xmlns="http://sed-ml.org/sed-ml/level1/version4" level="1" version="4">
  <annotation>
    <a xmlns="http://example.com/a">1</a>
    <a xmlns="http://example.com/a">2</a>
  </annotation>
</sedML>"#,
    );
    assert_eq!(
        doc.error_log().count(SedErrorCode::SedDuplicateAnnotationNamespaces),
        1
    );
    let root = doc.root();
    doc.base_mut(root).unwrap().remove_duplicate_annotations();
    let ann = doc.base(root).unwrap().annotation().unwrap();
    assert_eq!(ann.num_children(), 2);
    assert_eq!(ann.child(1).unwrap().name(), "duplicateTopLevelElements");
}

#[test]
fn notes_survive_writing() {
    init();
    let mut doc = SedDocument::new(1, 4);
    let root = doc.root();
    let notes = XmlNode::parse_fragment(
        r#"<body xmlns="http://www.w3.org/1999/xhtml"><p>first</p></body>"#,
        None,
    )
    .unwrap();
    doc.base_mut(root).unwrap().set_notes(Some(&notes)).unwrap();
    doc.append_notes_str(root, r#"<p xmlns="http://www.w3.org/1999/xhtml">second</p>"#)
        .unwrap();
    doc.append_annotation_str(root, r#"<tool xmlns="http://example.com/tool"/>"#)
        .unwrap();

    let xml = write_sedml_to_string(&doc).unwrap();
    let notes_at = xml.find("<notes>").unwrap();
    let annotation_at = xml.find("<annotation>").unwrap();
    assert!(notes_at < annotation_at, "{}", &xml);

    let back = read_sedml_from_string(&xml);
    assert_eq!(back.num_errors(), 0, "{:?}", back.error_log().errors());
    let body = back.base(back.root()).unwrap().notes().unwrap().child(0).unwrap();
    assert_eq!(body.name(), "body");
    assert_eq!(body.num_children(), 2);
    assert_eq!(body.child(1).unwrap().child(0).unwrap().characters(), "second");
}
