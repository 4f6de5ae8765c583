//! Worksheet form controls (`<controls>`).
//!
//! Excel wraps each control in markup-compatibility `mc:AlternateContent` so older readers can
//! skip it, and positions controls with a spreadsheet-drawing anchor, so a single `<controls>`
//! element mixes the main, `mc`, `xdr` and `r` namespaces.

use crate::error::ValidationError;
use crate::field::{DefaultValue, Field, FieldKind};
use crate::namespaces::{MC_NS, SHEET_DRAWING_NS, SHEET_MAIN_NS};
use crate::schema::{Record, Schema};
use crate::validators::Validator;
use crate::value::{ScalarKind, Value};

const NON_NEGATIVE: &[Validator] = &[Validator::min_int(0)];

const fn marker_cell(name: &'static str) -> Field {
    Field::new(name, FieldKind::Text(ScalarKind::Int))
        .in_namespace(SHEET_DRAWING_NS)
        .validate(NON_NEGATIVE)
}

/// `from` / `to`: zero-based cell plus EMU offset. The marker itself is in the parent's
/// namespace; its cells are `xdr:` elements.
pub static ANCHOR_MARKER: Schema = Schema {
    elements: &[
        marker_cell("col"),
        Field::new("colOff", FieldKind::Text(ScalarKind::Int)).in_namespace(SHEET_DRAWING_NS),
        marker_cell("row"),
        Field::new("rowOff", FieldKind::Text(ScalarKind::Int)).in_namespace(SHEET_DRAWING_NS),
    ],
    ..Schema::new("from")
};

pub static OBJECT_ANCHOR: Schema = Schema {
    attributes: &[
        Field::bool("moveWithCells").with_default(DefaultValue::Bool(false)),
        Field::bool("sizeWithCells").with_default(DefaultValue::Bool(false)),
    ],
    elements: &[
        Field::typed("from", &ANCHOR_MARKER),
        Field::typed("to", &ANCHOR_MARKER),
    ],
    ..Schema::new("anchor")
};

pub static CONTROL_PR: Schema = Schema {
    attributes: &[
        Field::bool("locked").with_default(DefaultValue::Bool(true)),
        Field::bool("defaultSize").with_default(DefaultValue::Bool(true)),
        Field::bool("print").with_default(DefaultValue::Bool(true)),
        Field::bool("disabled").with_default(DefaultValue::Bool(false)),
        Field::bool("recalcAlways").with_default(DefaultValue::Bool(false)),
        Field::bool("uiObject").with_default(DefaultValue::Bool(false)),
        Field::bool("autoFill").with_default(DefaultValue::Bool(true)),
        Field::bool("autoLine").with_default(DefaultValue::Bool(true)),
        Field::bool("autoPict").with_default(DefaultValue::Bool(true)),
        Field::text("macro").optional(),
        Field::text("altText").optional(),
        Field::text("linkedCell").optional(),
        Field::text("listFillRange").optional(),
        Field::text("cf").with_default(DefaultValue::Text("pict")),
        Field::relation("id"),
    ],
    elements: &[Field::typed("anchor", &OBJECT_ANCHOR).optional()],
    ..Schema::new("controlPr")
};

pub static CONTROL: Schema = Schema {
    namespace: Some(SHEET_MAIN_NS),
    attributes: &[
        Field::int("shapeId"),
        Field::text("name").optional(),
        Field::relation("id"),
    ],
    elements: &[Field::typed("controlPr", &CONTROL_PR).optional()],
    ..Schema::new("control")
};

pub static CHOICE: Schema = Schema {
    namespace: Some(MC_NS),
    attributes: &[Field::text("Requires")],
    elements: &[Field::typed("control", &CONTROL)],
    ..Schema::new("Choice")
};

pub static FALLBACK: Schema = Schema {
    namespace: Some(MC_NS),
    elements: &[Field::typed("control", &CONTROL).optional()],
    ..Schema::new("Fallback")
};

pub static ALTERNATE_CONTENT: Schema = Schema {
    namespace: Some(MC_NS),
    elements: &[
        Field::typed("Choice", &CHOICE),
        Field::typed("Fallback", &FALLBACK).optional(),
    ],
    ..Schema::new("AlternateContent")
};

pub static CONTROLS: Schema = Schema {
    namespace: Some(SHEET_MAIN_NS),
    elements: &[
        Field::sequence("AlternateContent", &ALTERNATE_CONTENT),
        Field::sequence("control", &CONTROL),
    ],
    ..Schema::new("controls")
};

/// Wrap `control` in `mc:AlternateContent` requiring the given extension prefix (usually `x14`).
pub fn alternate_content(requires: &str, control: Record) -> Result<Record, ValidationError> {
    let choice = Record::build(
        &CHOICE,
        [("Requires", Value::from(requires)), ("control", Value::from(control))],
    )?;
    Record::build(&ALTERNATE_CONTENT, [("Choice", choice)])
}

/// Every control in the list: the preferred `mc:Choice` of each alternate-content block first,
/// then the unwrapped controls.
pub fn all_controls(controls: &Record) -> Vec<&Record> {
    controls
        .records("AlternateContent")
        .filter_map(|ac| ac.get_record("Choice"))
        .filter_map(|choice| choice.get_record("control"))
        .chain(controls.records("control"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::assert_xml_semantic_eq;
    use crate::error::Error;
    use crate::namespaces::{NamespaceRegistry, REL_NS};
    use crate::tree::{from_tree, from_tree_with_warnings, to_tree};
    use crate::xml::XmlElement;
    use pretty_assertions::assert_eq;

    const SHEET_CONTROLS: &str = r#"<controls xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
        xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
        xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
        xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing">
      <mc:AlternateContent>
        <mc:Choice Requires="x14">
          <control shapeId="1025" r:id="rId4" name="Check Box 1">
            <controlPr defaultSize="0" autoFill="0" autoLine="0" autoPict="0">
              <anchor moveWithCells="1">
                <from><xdr:col>1</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>2</xdr:row><xdr:rowOff>0</xdr:rowOff></from>
                <to><xdr:col>3</xdr:col><xdr:colOff>95250</xdr:colOff><xdr:row>4</xdr:row><xdr:rowOff>19050</xdr:rowOff></to>
              </anchor>
            </controlPr>
          </control>
        </mc:Choice>
      </mc:AlternateContent>
      <control shapeId="1026" r:id="rId5"/>
    </controls>"#;

    #[test]
    fn parses_controls_across_namespaces() {
        let node = XmlElement::parse_str(SHEET_CONTROLS).unwrap();
        let parsed = from_tree_with_warnings(&CONTROLS, &node).unwrap();
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);

        let controls = all_controls(&parsed.record);
        let shape_ids: Vec<_> = controls.iter().filter_map(|c| c.get_int("shapeId")).collect();
        assert_eq!(shape_ids, vec![1025, 1026]);
        assert_eq!(controls[0].get_str("id"), Some("rId4"));

        let pr = controls[0].get_record("controlPr").unwrap();
        assert_eq!(pr.get_bool("defaultSize"), Some(false));
        assert_eq!(pr.get_bool("locked"), Some(true));
        assert_eq!(pr.get_str("cf"), Some("pict"));
        let to = pr.get_record("anchor").unwrap().get_record("to").unwrap();
        assert_eq!(to.get_int("colOff"), Some(95250));
    }

    #[test]
    fn anchor_marker_cells_are_drawing_elements() {
        let node = XmlElement::parse_str(SHEET_CONTROLS).unwrap();
        let record = from_tree(&CONTROLS, &node).unwrap();
        let tree = to_tree(&record);

        let anchor = tree.children[0].children[0].children[0].children[0].children[0].clone();
        assert_eq!(anchor.name.local, "anchor");
        assert_eq!(anchor.name.ns.as_deref(), Some(SHEET_MAIN_NS));
        let from = anchor.child("from").unwrap();
        assert_eq!(from.name.ns.as_deref(), Some(SHEET_MAIN_NS));
        let row = from.child("row").unwrap();
        assert_eq!(row.name.ns.as_deref(), Some(SHEET_DRAWING_NS));
        assert_eq!(row.text.as_deref(), Some("2"));
    }

    #[test]
    fn serializes_back_to_equivalent_xml() {
        let node = XmlElement::parse_str(SHEET_CONTROLS).unwrap();
        let record = from_tree(&CONTROLS, &node).unwrap();
        let xml = to_tree(&record)
            .to_xml_string(&NamespaceRegistry::default())
            .unwrap();
        assert_xml_semantic_eq(SHEET_CONTROLS, &xml);
    }

    #[test]
    fn choice_requires_a_control() {
        let node = XmlElement::parse_str(&format!(
            r#"<mc:AlternateContent xmlns:mc="{MC_NS}"><mc:Choice Requires="x14"/></mc:AlternateContent>"#
        ))
        .unwrap();
        assert!(matches!(
            from_tree(&ALTERNATE_CONTENT, &node),
            Err(Error::MissingElement {
                element: "Choice",
                child: "control"
            })
        ));
    }

    #[test]
    fn builds_wrapped_controls() {
        let control = Record::build(&CONTROL, [("shapeId", 1027)]).unwrap();
        let mut list = Record::new(&CONTROLS);
        list.push("AlternateContent", alternate_content("x14", control).unwrap())
            .unwrap();

        let tree = to_tree(&list);
        let ac = tree.child("AlternateContent").unwrap();
        assert_eq!(ac.name.ns.as_deref(), Some(MC_NS));
        let control = ac.child("Choice").unwrap().child("control").unwrap();
        assert_eq!(control.name.ns.as_deref(), Some(SHEET_MAIN_NS));
        assert_eq!(control.attr_ns(Some(REL_NS), "id"), None);
        assert_eq!(all_controls(&list).len(), 1);
    }
}
