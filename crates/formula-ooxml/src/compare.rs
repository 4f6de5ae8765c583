//! Semantic XML comparison for round-trip tests.
//!
//! Documents are compared as namespace-resolved trees, so prefix choice, attribute order and
//! whitespace between elements do not matter. This is not a canonicalization algorithm.

use crate::error::Result;
use crate::xml::XmlElement;

pub fn normalize_xml(xml: &str) -> Result<XmlElement> {
    Ok(XmlElement::parse_str(xml)?.normalized())
}

/// Panics when the documents differ.
pub fn assert_xml_semantic_eq(expected: &str, actual: &str) {
    let expected = normalize_xml(expected).expect("normalize expected xml");
    let actual = normalize_xml(actual).expect("normalize actual xml");
    assert_eq!(expected, actual);
}

pub fn assert_tree_eq(expected: &XmlElement, actual: &XmlElement) {
    assert_eq!(expected.normalized(), actual.normalized());
}
