#![no_main]

use libfuzzer_sys::fuzz_target;

use formula_ooxml::schemas::{connections, controls, filters, hyperlinks};
use formula_ooxml::{
    from_tree_with_options, to_tree, NamespaceRegistry, ReadOptions, Schema, XmlElement,
};

/// Part-sized inputs are enough to reach every code path; larger ones only slow the fuzzer down.
const MAX_INPUT_BYTES: usize = 64 * 1024;

static ROOTS: &[&Schema] = &[
    &filters::AUTO_FILTER,
    &filters::SORT_STATE,
    &hyperlinks::HYPERLINKS,
    &connections::CONNECTIONS,
    &controls::CONTROLS,
];

fuzz_target!(|data: &[u8]| {
    let data = &data[..data.len().min(MAX_INPUT_BYTES)];
    let input = String::from_utf8_lossy(data);

    let Ok(node) = XmlElement::parse_str(&input) else {
        return;
    };
    let options = ReadOptions { max_depth: 32 };

    for schema in ROOTS {
        let Ok(parsed) = from_tree_with_options(schema, &node, &options) else {
            continue;
        };
        // Anything that parses must be stable under write -> parse -> write. Compare the XML text
        // rather than records: NaN values never compare equal.
        let registry = NamespaceRegistry::default();
        let xml = to_tree(&parsed.record)
            .to_xml_string(&registry)
            .expect("serialize parsed record");
        let node = XmlElement::parse_str(&xml).expect("reparse written xml");
        let again = from_tree_with_options(schema, &node, &options).expect("parse written xml");
        let xml_again = to_tree(&again.record)
            .to_xml_string(&registry)
            .expect("serialize reparsed record");
        assert_eq!(xml, xml_again);
    }
});
