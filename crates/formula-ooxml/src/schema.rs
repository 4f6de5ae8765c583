//! Schema declarations and the records built from them.

use std::fmt;

use crate::error::ValidationError;
use crate::field::Field;
use crate::value::Value;

/// Record-level invariant spanning several fields.
pub type RecordCheck = fn(&Record) -> Result<(), ValidationError>;

/// The declared shape of one XML element kind.
///
/// Schemas are `static` tables; field order is the XML order on output.
pub struct Schema {
    pub tagname: &'static str,
    pub namespace: Option<&'static str>,
    pub attributes: &'static [Field],
    pub elements: &'static [Field],
    /// Groups of element fields of which at most one may hold a value.
    pub choices: &'static [&'static [&'static str]],
    pub check: Option<RecordCheck>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("tagname", &self.tagname)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// A schema with no fields; fill in the rest with struct update syntax.
    pub const fn new(tagname: &'static str) -> Self {
        Self {
            tagname,
            namespace: None,
            attributes: &[],
            elements: &[],
            choices: &[],
            check: None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static Field> {
        self.attributes.iter().chain(self.elements.iter())
    }

    pub fn field_count(&self) -> usize {
        self.attributes.len() + self.elements.len()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields().find(|f| f.name == name)
    }

    fn field_at(&self, index: usize) -> &'static Field {
        match index.checked_sub(self.attributes.len()) {
            None => &self.attributes[index],
            Some(i) => &self.elements[i],
        }
    }

    fn choice_group(&self, name: &str) -> Option<&'static [&'static str]> {
        self.choices.iter().copied().find(|g| g.contains(&name))
    }
}

/// One instance of a [`Schema`]: a value slot per declared field.
#[derive(Clone)]
pub struct Record {
    schema: &'static Schema,
    slots: Vec<Option<Value>>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.schema, other.schema) && self.slots == other.slots
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entry(&"<tag>", &self.schema.tagname);
        for (field, slot) in self.schema.fields().zip(&self.slots) {
            if let Some(value) = slot {
                map.entry(&field.name, value);
            }
        }
        map.finish()
    }
}

impl Record {
    /// A record with every field at its declared default.
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            slots: schema.fields().map(Field::initial_value).collect(),
        }
    }

    /// Build a record from several assignments. Every mandatory field must be given; record-level
    /// invariants are checked once at the end.
    pub fn build<'a, I, V>(schema: &'static Schema, fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<Value>,
    {
        let mut record = Self::new(schema);
        for (name, value) in fields {
            let index = record.index_of(name)?;
            record.assign(index, value.into(), false)?;
        }
        if let Some(field) = record.missing_field() {
            return Err(ValidationError::Required { field: field.name });
        }
        record.check_invariants()?;
        Ok(record)
    }

    /// First mandatory field that has no value.
    pub fn missing_field(&self) -> Option<&'static Field> {
        self.schema
            .fields()
            .zip(&self.slots)
            .find(|(field, slot)| field.is_mandatory() && slot.is_none())
            .map(|(field, _)| field)
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn tagname(&self) -> &'static str {
        self.schema.tagname
    }

    fn index_of(&self, name: &str) -> Result<usize, ValidationError> {
        self.schema
            .field_index(name)
            .ok_or_else(|| ValidationError::UnknownField {
                schema: self.schema.tagname,
                field: name.to_string(),
            })
    }

    /// Validate and store `value`. On error the record is unchanged.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidationError> {
        let index = self.index_of(name)?;
        self.assign(index, value.into(), true)
    }

    /// Reset a field to its default, or remove it when it has none.
    pub fn clear(&mut self, name: &str) -> Result<(), ValidationError> {
        let index = self.index_of(name)?;
        let field = self.schema.field_at(index);
        let initial = field.initial_value();
        if initial.is_none() && !field.allow_none {
            return Err(ValidationError::Required { field: field.name });
        }
        self.commit(index, initial, true)
    }

    /// Append one item to a sequence field.
    pub fn push(&mut self, name: &str, item: impl Into<Value>) -> Result<(), ValidationError> {
        let index = self.index_of(name)?;
        let field = self.schema.field_at(index);
        if !field.kind.is_list() {
            return Err(ValidationError::TypeMismatch {
                field: field.name,
                expected: "list",
                found: "scalar field",
            });
        }
        let mut items = self.slots[index]
            .as_ref()
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        items.push(item.into());
        self.assign(index, Value::List(items), true)
    }

    pub(crate) fn assign(
        &mut self,
        index: usize,
        value: Value,
        run_check: bool,
    ) -> Result<(), ValidationError> {
        let field = self.schema.field_at(index);
        let value = field.validate_value(value)?;
        self.check_choice(field, &value)?;
        self.commit(index, Some(value), run_check)
    }

    fn commit(
        &mut self,
        index: usize,
        value: Option<Value>,
        run_check: bool,
    ) -> Result<(), ValidationError> {
        if run_check && self.schema.check.is_some() {
            let mut tentative = self.clone();
            tentative.slots[index] = value;
            tentative.check_invariants()?;
            *self = tentative;
        } else {
            self.slots[index] = value;
        }
        Ok(())
    }

    fn check_choice(&self, field: &Field, value: &Value) -> Result<(), ValidationError> {
        let Some(group) = self.schema.choice_group(field.name) else {
            return Ok(());
        };
        if is_empty_value(value) {
            return Ok(());
        }
        for other in group.iter().copied().filter(|n| *n != field.name) {
            if self.get(other).is_some_and(|v| !is_empty_value(v)) {
                return Err(ValidationError::ChoiceConflict {
                    field: field.name,
                    existing: other,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn check_invariants(&self) -> Result<(), ValidationError> {
        match self.schema.check {
            Some(check) => check(self),
            None => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.field_index(name)?;
        self.slots[index].as_ref()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_record(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Value::as_record)
    }

    /// Mutable access to a nested record. Changes are validated by the nested record's own
    /// setters.
    pub fn get_record_mut(&mut self, name: &str) -> Option<&mut Record> {
        let index = self.schema.field_index(name)?;
        self.slots[index].as_mut().and_then(Value::as_record_mut)
    }

    /// Items of a sequence field (empty for absent or non-list fields).
    pub fn get_list(&self, name: &str) -> &[Value] {
        self.get(name).and_then(Value::as_list).unwrap_or_default()
    }

    /// Records held by a sequence field, in order.
    pub fn records<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Record> + 'a {
        self.get_list(name).iter().filter_map(Value::as_record)
    }

    /// Declared fields paired with their current values.
    pub fn entries(&self) -> impl Iterator<Item = (&'static Field, Option<&Value>)> + '_ {
        self.schema.fields().zip(self.slots.iter().map(Option::as_ref))
    }

    /// True when every field is at its initial value.
    pub fn is_default(&self) -> bool {
        self.entries()
            .all(|(field, value)| value.cloned() == field.initial_value())
    }
}

fn is_empty_value(value: &Value) -> bool {
    matches!(value, Value::List(items) if items.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DefaultValue;
    use crate::validators::Validator;
    use crate::value::ScalarKind;

    const PERCENT: &[Validator] = &[Validator::int_range(0, 100)];

    static ITEM: Schema = Schema {
        attributes: &[Field::text("name")],
        ..Schema::new("item")
    };

    static SAMPLE: Schema = Schema {
        attributes: &[
            Field::int("pct").validate(PERCENT).optional(),
            Field::bool("flag").with_default(DefaultValue::Bool(false)),
            Field::int("id"),
        ],
        elements: &[
            Field::typed("item", &ITEM).optional(),
            Field::sequence("entry", &ITEM),
            Field::value_sequence("v", ScalarKind::Int),
        ],
        choices: &[&["item", "entry"]],
        ..Schema::new("sample")
    };

    #[test]
    fn new_records_start_at_defaults() {
        let record = Record::new(&SAMPLE);
        assert_eq!(record.get_bool("flag"), Some(false));
        assert_eq!(record.get("pct"), None);
        assert!(record.get_list("entry").is_empty());
        assert!(record.is_default());
    }

    #[test]
    fn failed_assignment_leaves_record_untouched() {
        let mut record = Record::new(&SAMPLE);
        record.set("pct", 50).unwrap();
        let before = record.clone();
        assert!(matches!(
            record.set("pct", 150),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(record, before);
        assert_eq!(record.get_int("pct"), Some(50));
    }

    #[test]
    fn unknown_fields_and_required_clears_are_rejected() {
        let mut record = Record::new(&SAMPLE);
        assert!(matches!(
            record.set("nope", 1),
            Err(ValidationError::UnknownField { .. })
        ));
        record.set("id", 3).unwrap();
        assert_eq!(
            record.clear("id"),
            Err(ValidationError::Required { field: "id" })
        );
        record.set("flag", true).unwrap();
        record.clear("flag").unwrap();
        assert_eq!(record.get_bool("flag"), Some(false));
    }

    #[test]
    fn nested_records_must_match_the_declared_schema() {
        let mut record = Record::new(&SAMPLE);
        let err = record.set("item", Record::new(&SAMPLE)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch {
                expected: "item",
                found: "sample",
                ..
            }
        ));
    }

    #[test]
    fn choice_groups_are_exclusive() {
        let mut record = Record::new(&SAMPLE);
        let item = Record::build(&ITEM, [("name", "a")]).unwrap();
        record.push("entry", item.clone()).unwrap();
        assert_eq!(
            record.set("item", item),
            Err(ValidationError::ChoiceConflict {
                field: "item",
                existing: "entry"
            })
        );
    }

    #[test]
    fn push_appends_in_order() {
        let mut record = Record::new(&SAMPLE);
        for n in [3, 1, 2] {
            record.push("v", n).unwrap();
        }
        assert_eq!(
            record.get_list("v"),
            &[Value::Int(3), Value::Int(1), Value::Int(2)]
        );
        assert!(record.push("pct", 1).is_err());
    }

    #[test]
    fn build_requires_mandatory_fields() {
        assert_eq!(
            Record::build(&SAMPLE, [("pct", 5)]),
            Err(ValidationError::Required { field: "id" })
        );
        let mut record = Record::new(&SAMPLE);
        assert_eq!(record.missing_field().map(|f| f.name), Some("id"));
        record.set("id", 1).unwrap();
        assert_eq!(record.missing_field().map(|f| f.name), None);
    }

    #[test]
    fn equality_is_field_wise() {
        let a = Record::build(&SAMPLE, [("id", Value::Int(1)), ("pct", Value::Int(5))]).unwrap();
        let mut b = Record::build(&SAMPLE, [("pct", 5), ("id", 1)]).unwrap();
        assert_eq!(a, b);
        b.set("flag", true).unwrap();
        assert_ne!(a, b);
        assert_ne!(Record::new(&ITEM), Record::new(&SAMPLE));
    }
}
