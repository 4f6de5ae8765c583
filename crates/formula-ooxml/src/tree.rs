//! Conversion between [`Record`]s and [`XmlElement`] trees.
//!
//! Both directions walk the schema table: attributes in declared order, then element fields in
//! declared order. Writing is a pure transform and cannot fail; reading validates every value
//! through the same setters callers use, so a parsed record is always a valid record.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::field::{Field, FieldKind};
use crate::namespaces::QName;
use crate::schema::{Record, Schema};
use crate::value::{parse_scalar, ScalarKind, Value};
use crate::warning::UnknownContentWarning;
use crate::xml::XmlElement;

/// Knobs for [`to_tree_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Omit attributes and value children equal to their declared default, unless the field is
    /// marked [`Field::keep_default`].
    pub elide_defaults: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            elide_defaults: true,
        }
    }
}

/// Limits applied by [`from_tree_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum nesting of schema-backed elements, counting the root.
    pub max_depth: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// A parsed record plus everything that was tolerated but dropped along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub record: Record,
    pub warnings: Vec<UnknownContentWarning>,
}

pub fn to_tree(record: &Record) -> XmlElement {
    to_tree_with_options(record, &WriteOptions::default())
}

pub fn to_tree_with_options(record: &Record, options: &WriteOptions) -> XmlElement {
    let schema = record.schema();
    write_record(record, schema.tagname, schema.namespace, options)
}

fn write_record(
    record: &Record,
    tag: &str,
    ns: Option<&str>,
    options: &WriteOptions,
) -> XmlElement {
    let mut node = XmlElement::new(QName::new(ns, tag));

    for (field, value) in record.entries() {
        let Some(value) = value else { continue };
        if options.elide_defaults && !field.keep_default && field.is_default(value) {
            continue;
        }

        match field.kind {
            FieldKind::Scalar(_) => {
                if let Some(text) = value.render() {
                    node.attrs
                        .push((QName::new(field.namespace, field.name), text));
                }
            }
            FieldKind::Typed(schema) => {
                if let Value::Record(child) = value {
                    let child_ns = child_namespace(field, Some(schema), ns);
                    node.children
                        .push(write_record(child, field.name, child_ns, options));
                }
            }
            FieldKind::Sequence(schema) => {
                let child_ns = child_namespace(field, Some(schema), ns);
                for child in value.as_list().unwrap_or_default() {
                    if let Value::Record(child) = child {
                        node.children
                            .push(write_record(child, field.name, child_ns, options));
                    }
                }
            }
            FieldKind::NestedValue { attr, .. } => {
                if let Some(child) = value_child(field, attr, value, ns) {
                    node.children.push(child);
                }
            }
            FieldKind::ValueSequence { attr, .. } => {
                for item in value.as_list().unwrap_or_default() {
                    if let Some(child) = value_child(field, attr, item, ns) {
                        node.children.push(child);
                    }
                }
            }
            FieldKind::Text(_) => {
                if let Some(text) = value.render() {
                    let mut child =
                        XmlElement::new(QName::new(child_namespace(field, None, ns), field.name));
                    child.text = Some(text);
                    node.children.push(child);
                }
            }
        }
    }

    node
}

fn value_child(field: &Field, attr: &str, value: &Value, ns: Option<&str>) -> Option<XmlElement> {
    let text = value.render()?;
    let mut child = XmlElement::new(QName::new(child_namespace(field, None, ns), field.name));
    child.attrs.push((QName::local(attr), text));
    Some(child)
}

/// Namespace of a child element: the field's own, else the child schema's, else the parent's.
fn child_namespace<'a>(
    field: &Field,
    schema: Option<&Schema>,
    parent: Option<&'a str>,
) -> Option<&'a str> {
    field
        .namespace
        .or_else(|| schema.and_then(|s| s.namespace))
        .or(parent)
}

/// Namespaces only have to agree when both sides name one.
fn namespace_matches(expected: Option<&str>, found: Option<&str>) -> bool {
    match (expected, found) {
        (Some(expected), Some(found)) => expected == found,
        _ => true,
    }
}

/// Parse `node` as an instance of `schema`, logging (rather than returning) unknown content.
pub fn from_tree(schema: &'static Schema, node: &XmlElement) -> Result<Record> {
    let parsed = from_tree_with_warnings(schema, node)?;
    for warning in &parsed.warnings {
        warn!("{warning}");
    }
    Ok(parsed.record)
}

pub fn from_tree_with_warnings(schema: &'static Schema, node: &XmlElement) -> Result<Parsed> {
    from_tree_with_options(schema, node, &ReadOptions::default())
}

pub fn from_tree_with_options(
    schema: &'static Schema,
    node: &XmlElement,
    options: &ReadOptions,
) -> Result<Parsed> {
    if node.name.local != schema.tagname
        || !namespace_matches(schema.namespace, node.name.ns.as_deref())
    {
        return Err(Error::TagMismatch {
            expected: QName::new(schema.namespace, schema.tagname).to_string(),
            found: node.name.to_string(),
        });
    }

    let mut reader = Reader {
        options,
        warnings: Vec::new(),
    };
    let record = reader.read_record(schema, node, 1)?;
    Ok(Parsed {
        record,
        warnings: reader.warnings,
    })
}

struct Reader<'o> {
    options: &'o ReadOptions,
    warnings: Vec<UnknownContentWarning>,
}

impl Reader<'_> {
    fn read_record(
        &mut self,
        schema: &'static Schema,
        node: &XmlElement,
        depth: usize,
    ) -> Result<Record> {
        if depth > self.options.max_depth {
            return Err(Error::DepthLimit {
                max: self.options.max_depth,
            });
        }

        let mut record = Record::new(schema);
        self.read_attributes(&mut record, node)?;
        self.read_children(&mut record, node, depth)?;
        record.check_invariants()?;
        Ok(record)
    }

    fn read_attributes(&mut self, record: &mut Record, node: &XmlElement) -> Result<()> {
        let schema = record.schema();

        for (name, raw) in &node.attrs {
            let found = schema.fields().enumerate().find(|(_, f)| {
                f.kind.is_attribute()
                    && f.name == name.local
                    && f.namespace == name.ns.as_deref()
            });
            let Some((index, field)) = found else {
                self.warnings
                    .push(UnknownContentWarning::UnrecognizedAttribute {
                        element: node.name.local.clone(),
                        attr: name.to_string(),
                    });
                continue;
            };
            let FieldKind::Scalar(kind) = field.kind else {
                continue;
            };
            let value = parse_field_value(node, field, kind, raw)?;
            record.assign(index, value, false)?;
        }

        for field in schema.attributes {
            if field.kind.is_attribute() && field.is_mandatory() && record.get(field.name).is_none()
            {
                return Err(Error::MissingAttribute {
                    element: schema.tagname,
                    attr: field.name,
                });
            }
        }
        Ok(())
    }

    fn read_children(&mut self, record: &mut Record, node: &XmlElement, depth: usize) -> Result<()> {
        let schema = record.schema();
        let parent_ns = node.name.ns.as_deref();
        // Sequence items are gathered first and assigned once so length validators see the whole
        // list.
        let mut pending: Vec<Option<Vec<Value>>> = vec![None; schema.field_count()];

        for child in &node.children {
            let found = schema.fields().enumerate().find(|(_, f)| {
                !f.kind.is_attribute()
                    && f.name == child.name.local
                    && namespace_matches(
                        child_namespace(f, f.kind.schema(), parent_ns),
                        child.name.ns.as_deref(),
                    )
            });
            let Some((index, field)) = found else {
                debug!(
                    "skipping unrecognized child <{}> of <{}>",
                    child.name, schema.tagname
                );
                self.warnings.push(UnknownContentWarning::UnrecognizedElement {
                    parent: node.name.local.clone(),
                    element: child.name.local.clone(),
                });
                continue;
            };

            match field.kind {
                FieldKind::Scalar(_) => {}
                FieldKind::Typed(child_schema) => {
                    // A repeated single child keeps the last occurrence.
                    let value = self.read_record(child_schema, child, depth + 1)?;
                    record.assign(index, Value::from(value), false)?;
                }
                FieldKind::Sequence(child_schema) => {
                    let value = self.read_record(child_schema, child, depth + 1)?;
                    pending[index]
                        .get_or_insert_with(Vec::new)
                        .push(Value::from(value));
                }
                FieldKind::NestedValue { kind, attr } => {
                    let value = read_value_child(child, field, kind, attr)?;
                    record.assign(index, value, false)?;
                }
                FieldKind::ValueSequence { kind, attr } => {
                    let value = read_value_child(child, field, kind, attr)?;
                    pending[index].get_or_insert_with(Vec::new).push(value);
                }
                FieldKind::Text(kind) => {
                    let raw = child.text.as_deref().unwrap_or_default();
                    let value = parse_field_value(child, field, kind, raw)?;
                    record.assign(index, value, false)?;
                }
            }
        }

        for (index, items) in pending.into_iter().enumerate() {
            if let Some(items) = items {
                record.assign(index, Value::List(items), false)?;
            }
        }

        for field in schema.elements {
            if !field.kind.is_attribute() && field.is_mandatory() && record.get(field.name).is_none()
            {
                return Err(Error::MissingElement {
                    element: schema.tagname,
                    child: field.name,
                });
            }
        }
        Ok(())
    }
}

/// `<name attr="..."/>`. A boolean flag written as a bare `<name/>` means `true`.
fn read_value_child(
    child: &XmlElement,
    field: &'static Field,
    kind: ScalarKind,
    attr: &'static str,
) -> Result<Value> {
    match child.attr(attr) {
        Some(raw) => parse_field_value(child, field, kind, raw),
        None if kind == ScalarKind::Bool => Ok(Value::Bool(true)),
        None => Err(Error::MissingAttribute {
            element: field.name,
            attr,
        }),
    }
}

fn parse_field_value(
    node: &XmlElement,
    field: &'static Field,
    kind: ScalarKind,
    raw: &str,
) -> Result<Value> {
    parse_scalar(kind, raw).ok_or_else(|| Error::Parse {
        element: node.name.local.clone(),
        field: field.name,
        raw: raw.to_string(),
        expected: kind.name(),
    })
}
