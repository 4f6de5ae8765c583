use formula_ooxml::schemas::filters::{custom_filter, CUSTOM_FILTER, FILTERS, TOP10};
use formula_ooxml::{
    from_tree, from_tree_with_warnings, to_tree, DefaultValue, Error, Field, QName, Record,
    ScalarKind, Schema, UnknownContentWarning, ValidationError, Validator, Value, XmlElement,
};
use pretty_assertions::assert_eq;

const PERCENT: &[Validator] = &[Validator::int_range(0, 100)];

static PROGRESS: Schema = Schema {
    attributes: &[
        Field::int("pct").validate(PERCENT),
        Field::bool("done").with_default(DefaultValue::Bool(false)),
    ],
    elements: &[Field::value_sequence("step", ScalarKind::Int)],
    ..Schema::new("progress")
};

fn parse(schema: &'static Schema, xml: &str) -> formula_ooxml::Result<Record> {
    from_tree(schema, &XmlElement::parse_str(xml)?)
}

#[test]
fn bounded_integer_rejects_out_of_range_assignment() {
    let mut record = Record::new(&PROGRESS);
    let err = record.set("pct", 150).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::OutOfRange { field: "pct", .. }
    ));
    assert_eq!(record.get("pct"), None);

    record.set("pct", 50).unwrap();
    assert_eq!(record.get_int("pct"), Some(50));
}

#[test]
fn bounded_integer_rejects_out_of_range_xml() {
    let err = parse(&PROGRESS, r#"<progress pct="150"/>"#).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::OutOfRange { .. })
    ));

    let err = parse(&PROGRESS, r#"<progress pct="fifty"/>"#).unwrap_err();
    assert!(matches!(err, Error::Parse { field: "pct", .. }));
}

#[test]
fn defaults_are_elided_and_restored() {
    let record = Record::build(&PROGRESS, [("pct", 10)]).unwrap();
    let tree = to_tree(&record);
    assert_eq!(tree.attr("done"), None);
    assert_eq!(tree.attr("pct"), Some("10"));

    let parsed = parse(&PROGRESS, r#"<progress pct="10"/>"#).unwrap();
    assert_eq!(parsed.get_bool("done"), Some(false));
    assert_eq!(parsed, record);

    let top10 = Record::build(&TOP10, [("val", 5.0)]).unwrap();
    assert_eq!(to_tree(&top10).attr("top"), None);
}

#[test]
fn booleans_render_as_one_and_zero() {
    let record = Record::build(&PROGRESS, [("pct", Value::Int(1)), ("done", Value::Bool(true))])
        .unwrap();
    assert_eq!(to_tree(&record).attr("done"), Some("1"));

    for (raw, expected) in [("1", true), ("0", false), ("true", true), ("false", false)] {
        let xml = format!(r#"<progress pct="1" done="{raw}"/>"#);
        assert_eq!(parse(&PROGRESS, &xml).unwrap().get_bool("done"), Some(expected));
    }
    assert!(parse(&PROGRESS, r#"<progress pct="1" done="yes"/>"#).is_err());
}

#[test]
fn string_custom_filter_needs_a_wildcard() {
    let err = custom_filter("notEqual", "ab").unwrap_err();
    assert!(matches!(err, ValidationError::PatternMismatch { .. }));
    assert!(custom_filter("notEqual", "*ab").is_ok());

    let mut record = custom_filter("notEqual", "*ab").unwrap();
    assert!(record.set("val", "ab").is_err());
    assert_eq!(record.get_str("val"), Some("*ab"));

    assert!(parse(&CUSTOM_FILTER, r#"<customFilter operator="notEqual" val="*ab"/>"#).is_ok());
}

#[test]
fn sequences_keep_document_order() {
    let filters = parse(
        &FILTERS,
        r#"<filters><filter val="1"/><filter val="2"/><filter val="3"/></filters>"#,
    )
    .unwrap();
    assert_eq!(
        filters.get_list("filter"),
        &[Value::from("1"), Value::from("2"), Value::from("3")]
    );

    let vals: Vec<_> = to_tree(&filters)
        .children
        .iter()
        .filter_map(|c| c.attr("val").map(str::to_string))
        .collect();
    assert_eq!(vals, vec!["1", "2", "3"]);

    let progress = parse(
        &PROGRESS,
        r#"<progress pct="0"><step val="3"/><step val="1"/><step val="2"/></progress>"#,
    )
    .unwrap();
    assert_eq!(
        progress.get_list("step"),
        &[Value::Int(3), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn filter_values_keep_their_text() {
    let filters = parse(
        &FILTERS,
        r#"<filters>
          <filter val="0.316588716"/>
          <filter val="0.667439395"/>
          <filter val="0.823086999"/>
        </filters>"#,
    )
    .unwrap();
    let expected = Record::build(
        &FILTERS,
        [(
            "filter",
            Value::from(vec!["0.316588716", "0.667439395", "0.823086999"]),
        )],
    )
    .unwrap();
    assert_eq!(filters, expected);
}

#[test]
fn unknown_attribute_is_one_warning() {
    let node = XmlElement::parse_str(r#"<progress pct="5" foo="bar"/>"#).unwrap();
    let parsed = from_tree_with_warnings(&PROGRESS, &node).unwrap();
    assert_eq!(parsed.record, Record::build(&PROGRESS, [("pct", 5)]).unwrap());
    assert_eq!(
        parsed.warnings,
        vec![UnknownContentWarning::UnrecognizedAttribute {
            element: "progress".to_string(),
            attr: "foo".to_string(),
        }]
    );
    assert_eq!(
        parsed.warnings[0].to_string(),
        "unrecognized attribute `foo` on <progress>"
    );
}

#[test]
fn unknown_children_are_skipped_and_reported() {
    let node = XmlElement::parse_str(
        r#"<progress pct="5"><step val="1"/><extLst><ext uri="{X}"/></extLst><step val="2"/></progress>"#,
    )
    .unwrap();
    let parsed = from_tree_with_warnings(&PROGRESS, &node).unwrap();
    assert_eq!(
        parsed.record.get_list("step"),
        &[Value::Int(1), Value::Int(2)]
    );
    assert_eq!(parsed.warnings.len(), 1);
    assert!(matches!(
        &parsed.warnings[0],
        UnknownContentWarning::UnrecognizedElement { element, .. } if element == "extLst"
    ));
}

#[test]
fn wrong_root_tag_is_rejected() {
    let node = XmlElement::new(QName::local("regress"));
    assert!(matches!(
        from_tree(&PROGRESS, &node),
        Err(Error::TagMismatch { .. })
    ));
}
