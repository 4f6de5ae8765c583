//! Field descriptors.
//!
//! A [`Field`] is plain, immutable, `const`-constructible data. Schemas are `static` tables of
//! fields; per-instance values live in [`Record`](crate::Record) slots.

use crate::error::ValidationError;
use crate::namespaces::REL_NS;
use crate::schema::Schema;
use crate::validators::{check_all, Validator};
use crate::value::{ScalarKind, Value};

/// Declared default for a field (kept `const`-friendly; converted to a [`Value`] on use).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Int(n) => Value::Int(n),
            DefaultValue::Float(n) => Value::Float(n),
            DefaultValue::Text(s) => Value::Text(s.to_string()),
        }
    }
}

/// How a field is laid out in XML.
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// `name="value"` on the owning element.
    Scalar(ScalarKind),
    /// A single child element rendered by `schema`.
    Typed(&'static Schema),
    /// Zero or more child elements rendered by `schema`, in insertion order.
    Sequence(&'static Schema),
    /// A single `<name attr="value"/>` child.
    NestedValue { kind: ScalarKind, attr: &'static str },
    /// Zero or more `<name attr="value"/>` children.
    ValueSequence { kind: ScalarKind, attr: &'static str },
    /// A single `<name>value</name>` child.
    Text(ScalarKind),
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Scalar(kind) => write!(f, "Scalar({kind:?})"),
            FieldKind::Typed(schema) => write!(f, "Typed(<{}>)", schema.tagname),
            FieldKind::Sequence(schema) => write!(f, "Sequence(<{}>)", schema.tagname),
            FieldKind::NestedValue { kind, attr } => write!(f, "NestedValue({kind:?} @{attr})"),
            FieldKind::ValueSequence { kind, attr } => {
                write!(f, "ValueSequence({kind:?} @{attr})")
            }
            FieldKind::Text(kind) => write!(f, "Text({kind:?})"),
        }
    }
}

impl FieldKind {
    pub fn is_list(&self) -> bool {
        matches!(self, FieldKind::Sequence(_) | FieldKind::ValueSequence { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, FieldKind::Scalar(_))
    }

    pub fn schema(&self) -> Option<&'static Schema> {
        match *self {
            FieldKind::Typed(schema) | FieldKind::Sequence(schema) => Some(schema),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// XML local name of the attribute or child element; also the key used by setters.
    pub name: &'static str,
    /// Namespace of the attribute/child. Child elements without one inherit from their schema or
    /// parent.
    pub namespace: Option<&'static str>,
    pub kind: FieldKind,
    pub allow_none: bool,
    pub default: Option<DefaultValue>,
    pub validators: &'static [Validator],
    /// Write the value even when it equals `default`.
    pub keep_default: bool,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            namespace: None,
            kind,
            allow_none: false,
            default: None,
            validators: &[],
            keep_default: false,
        }
    }

    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Bool))
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Int))
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Float))
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Text))
    }

    /// Optional `r:id`-style relationship reference.
    pub const fn relation(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Relation))
            .in_namespace(REL_NS)
            .optional()
    }

    pub const fn typed(name: &'static str, schema: &'static Schema) -> Self {
        Self::new(name, FieldKind::Typed(schema))
    }

    pub const fn sequence(name: &'static str, schema: &'static Schema) -> Self {
        Self::new(name, FieldKind::Sequence(schema)).optional()
    }

    pub const fn nested_value(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, FieldKind::NestedValue { kind, attr: "val" })
    }

    pub const fn value_sequence(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, FieldKind::ValueSequence { kind, attr: "val" }).optional()
    }

    pub const fn text_element(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text(ScalarKind::Text))
    }

    pub const fn optional(self) -> Self {
        Self {
            allow_none: true,
            ..self
        }
    }

    pub const fn with_default(self, default: DefaultValue) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn validate(self, validators: &'static [Validator]) -> Self {
        Self { validators, ..self }
    }

    pub const fn in_namespace(self, namespace: &'static str) -> Self {
        Self {
            namespace: Some(namespace),
            ..self
        }
    }

    /// Rename the attribute carrying the value of a nested-value field (`val` by default).
    pub const fn value_attr(self, attr: &'static str) -> Self {
        let kind = match self.kind {
            FieldKind::NestedValue { kind, .. } => FieldKind::NestedValue { kind, attr },
            FieldKind::ValueSequence { kind, .. } => FieldKind::ValueSequence { kind, attr },
            other => other,
        };
        Self { kind, ..self }
    }

    pub const fn keep_default(self) -> Self {
        Self {
            keep_default: true,
            ..self
        }
    }

    /// A field that must be present after parsing.
    pub fn is_mandatory(&self) -> bool {
        !self.allow_none && self.default.is_none() && !self.kind.is_list()
    }

    /// Value a fresh record starts with.
    pub fn initial_value(&self) -> Option<Value> {
        if self.kind.is_list() {
            return Some(Value::List(Vec::new()));
        }
        self.default.map(DefaultValue::to_value)
    }

    pub fn is_default(&self, value: &Value) -> bool {
        self.default.is_some_and(|d| d.to_value() == *value)
    }

    /// Coerce `value` to this field's type and run its validators.
    pub fn validate_value(&self, value: Value) -> Result<Value, ValidationError> {
        let value = match self.kind {
            FieldKind::Scalar(kind)
            | FieldKind::NestedValue { kind, .. }
            | FieldKind::Text(kind) => coerce_scalar(self.name, kind, value)?,
            FieldKind::Typed(schema) => coerce_record(self.name, schema, value)?,
            FieldKind::Sequence(schema) => {
                let items = self.expect_list(value)?;
                Value::List(
                    items
                        .into_iter()
                        .map(|item| coerce_record(self.name, schema, item))
                        .collect::<Result<_, _>>()?,
                )
            }
            FieldKind::ValueSequence { kind, .. } => {
                let items = self.expect_list(value)?;
                let items = items
                    .into_iter()
                    .map(|item| {
                        let item = coerce_scalar(self.name, kind, item)?;
                        check_all(self.validators, self.name, &item)?;
                        Ok(item)
                    })
                    .collect::<Result<_, ValidationError>>()?;
                Value::List(items)
            }
        };
        check_all(self.validators, self.name, &value)?;
        Ok(value)
    }

    fn expect_list(&self, value: Value) -> Result<Vec<Value>, ValidationError> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(ValidationError::TypeMismatch {
                field: self.name,
                expected: "list",
                found: other.type_name(),
            }),
        }
    }
}

fn coerce_scalar(
    field: &'static str,
    kind: ScalarKind,
    value: Value,
) -> Result<Value, ValidationError> {
    match (kind, value) {
        (ScalarKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (ScalarKind::Int, Value::Int(n)) => Ok(Value::Int(n)),
        (ScalarKind::Int, Value::Float(f)) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Ok(Value::Int(f as i64))
            } else {
                Err(ValidationError::NotIntegral { field, value: f })
            }
        }
        (ScalarKind::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (ScalarKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (ScalarKind::Text | ScalarKind::Relation, Value::Text(s)) => Ok(Value::Text(s)),
        (kind, other) => Err(ValidationError::TypeMismatch {
            field,
            expected: kind.name(),
            found: other.type_name(),
        }),
    }
}

fn coerce_record(
    field: &'static str,
    schema: &'static Schema,
    value: Value,
) -> Result<Value, ValidationError> {
    match value {
        Value::Record(record) if std::ptr::eq(record.schema(), schema) => Ok(Value::Record(record)),
        Value::Record(record) => Err(ValidationError::TypeMismatch {
            field,
            expected: schema.tagname,
            found: record.schema().tagname,
        }),
        other => Err(ValidationError::TypeMismatch {
            field,
            expected: schema.tagname,
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERCENT: &[Validator] = &[Validator::int_range(0, 100)];

    #[test]
    fn integers_reject_fractions_and_accept_integral_floats() {
        let field = Field::int("pct").validate(PERCENT);
        assert_eq!(field.validate_value(Value::Float(50.0)), Ok(Value::Int(50)));
        assert_eq!(
            field.validate_value(Value::Float(0.5)),
            Err(ValidationError::NotIntegral {
                field: "pct",
                value: 0.5
            })
        );
        assert!(matches!(
            field.validate_value(Value::Int(150)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            field.validate_value(Value::from("50")),
            Err(ValidationError::TypeMismatch {
                expected: "integer",
                found: "string",
                ..
            })
        ));
    }

    #[test]
    fn builders_compose() {
        const FIELD: Field = Field::nested_value("x", ScalarKind::Int)
            .value_attr("v")
            .optional()
            .with_default(DefaultValue::Int(0))
            .keep_default();
        assert!(FIELD.allow_none);
        assert!(FIELD.keep_default);
        assert!(FIELD.is_default(&Value::Int(0)));
        assert!(matches!(FIELD.kind, FieldKind::NestedValue { attr: "v", .. }));
        assert!(!FIELD.is_mandatory());
        assert!(Field::int("id").is_mandatory());
    }

    #[test]
    fn relation_fields_live_in_the_relationships_namespace() {
        let field = Field::relation("id");
        assert_eq!(field.namespace, Some(REL_NS));
        assert!(field.allow_none);
    }
}
