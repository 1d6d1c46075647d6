// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical checks on identifiers and the XHTML content model permitted in notes.

use crate::error::SedErrorCode;
use crate::node::XmlNode;
use crate::token::XmlNamespaces;
use crate::XHTML_NS;

/// True if `s` is a valid SId: a letter or underscore, then letters, digits and underscores.
pub fn is_valid_sid(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True if `s` is a lexically valid XML `ID` as used for `metaid`.
pub fn is_valid_xml_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| {
        c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '\u{b7}')
    })
}

const ALLOWED_ELEMENTS: &[&str] = &[
    "a", "abbr", "acronym", "address", "applet", "b", "big", "blockquote", "br", "button",
    "caption", "center", "cite", "code", "del", "dfn", "dir", "div", "dl", "em", "fieldset",
    "font", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "iframe", "img", "input",
    "ins", "isindex", "kbd", "label", "map", "menu", "noframes", "noscript", "object", "ol",
    "p", "pre", "q", "s", "samp", "script", "select", "small", "span", "strike", "strong",
    "sub", "sup", "table", "textarea", "tt", "u", "ul", "var",
];

/// True if `node` is an element from the inline/block XHTML whitelist.
pub fn is_allowed_element(node: &XmlNode) -> bool {
    node.is_element() && ALLOWED_ELEMENTS.contains(&node.name())
}

/// True if `node` is placed in the XHTML namespace, either by its own
/// declarations or by `toplevel` binding its prefix.
pub fn has_declared_ns(node: &XmlNode, toplevel: Option<&XmlNamespaces>) -> bool {
    if node.namespaces().uri_for_prefix(node.prefix()) == Some(XHTML_NS) {
        return true;
    }
    toplevel
        .and_then(|ns| ns.uri_for_prefix(node.prefix()))
        .map_or(false, |uri| uri == XHTML_NS)
}

/// True if an `html` node has exactly a `head` then a `body`.
pub fn is_correct_html_node(node: &XmlNode) -> bool {
    let elements: Vec<&XmlNode> = node.children().iter().filter(|c| c.is_element()).collect();
    matches!(elements.as_slice(), [head, body] if head.name() == "head" && body.name() == "body")
}

/// Checks the content of a `notes` node, returning the problems found in order.
///
/// Several top-level children must each be whitelisted and in the XHTML
/// namespace. A single child may also be `html` (which must then be well
/// structured) or `body`.
pub fn check_notes_content(notes: &XmlNode, toplevel: Option<&XmlNamespaces>) -> Vec<SedErrorCode> {
    let mut problems = Vec::new();
    let children = notes.children();
    match children {
        [] => {}
        [only] => {
            let name = only.name();
            if !only.is_element() || (name != "html" && name != "body" && !is_allowed_element(only)) {
                problems.push(SedErrorCode::SedInvalidNotesContent);
            } else {
                if !has_declared_ns(only, toplevel) {
                    problems.push(SedErrorCode::SedNotesNotInXhtmlNamespace);
                }
                if name == "html" && !is_correct_html_node(only) {
                    problems.push(SedErrorCode::SedInvalidNotesContent);
                }
            }
        }
        _ => {
            for c in children {
                if !is_allowed_element(c) {
                    problems.push(SedErrorCode::SedInvalidNotesContent);
                } else if !has_declared_ns(c, toplevel) {
                    problems.push(SedErrorCode::SedNotesNotInXhtmlNamespace);
                }
            }
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(content: &str) -> XmlNode {
        XmlNode::parse_fragment(&format!("<notes>{}</notes>", content), None).unwrap()
    }

    #[test]
    fn sids() {
        assert!(is_valid_sid("m1"));
        assert!(is_valid_sid("_x_2"));
        assert!(!is_valid_sid("1m"));
        assert!(!is_valid_sid("a-b"));
        assert!(!is_valid_sid(""));
    }

    #[test]
    fn xml_ids() {
        assert!(is_valid_xml_id("meta_1"));
        assert!(is_valid_xml_id("a.b-c"));
        assert!(is_valid_xml_id("_\u{e9}t\u{e9}"));
        assert!(!is_valid_xml_id("1abc"));
        assert!(!is_valid_xml_id("a b"));
        assert!(!is_valid_xml_id(""));
    }

    #[test]
    fn notes_content() {
        let x = r#"xmlns="http://www.w3.org/1999/xhtml""#;
        assert!(check_notes_content(&notes(&format!("<p {}>a</p><p {}>b</p>", x, x)), None).is_empty());
        assert_eq!(
            check_notes_content(&notes(&format!("<p {}>a</p><p>b</p>", x)), None),
            vec![SedErrorCode::SedNotesNotInXhtmlNamespace]
        );
        assert_eq!(
            check_notes_content(&notes(&format!("<p {}>a</p><html {}/>", x, x)), None),
            vec![SedErrorCode::SedInvalidNotesContent]
        );
        assert!(check_notes_content(
            &notes(&format!("<html {}><head><title/></head><body/></html>", x)),
            None
        )
        .is_empty());
        assert_eq!(
            check_notes_content(&notes(&format!("<html {}><body/><head/></html>", x)), None),
            vec![SedErrorCode::SedInvalidNotesContent]
        );
        assert_eq!(
            check_notes_content(&notes("<blink/>"), None),
            vec![SedErrorCode::SedInvalidNotesContent]
        );
    }

    #[test]
    fn toplevel_prefix_counts() {
        let mut top = XmlNamespaces::new();
        top.add(XHTML_NS, "h");
        let n = XmlNode::parse_fragment("<notes><h:p>x</h:p></notes>", Some(&top)).unwrap();
        assert!(check_notes_content(&n, Some(&top)).is_empty());
        assert_eq!(
            check_notes_content(&n, None),
            vec![SedErrorCode::SedNotesNotInXhtmlNamespace]
        );
    }
}
