use crate::schema::Record;

/// Scalar types an attribute (or a `val`-style child) can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
    /// Opaque relationship id (`r:id`), resolved by the package layer.
    Relation,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::Int => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Text => "string",
            ScalarKind::Relation => "relationship id",
        }
    }
}

/// A field value held by a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Record(Box<Record>),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attribute text for a scalar value; `None` for records and lists.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some("0".to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(n) => Some(format_float(*n)),
            Value::Text(s) => Some(s.clone()),
            Value::Record(_) | Value::List(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(Box::new(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Canonical `xsd:double` text: shortest round-trip digits, fixed-point for ordinary magnitudes,
/// exponent form only for very large/small ones. Never emits `-0`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let abs = value.abs();
    if (1e-7..1e16).contains(&abs) {
        format!("{value}")
    } else {
        format!("{value:e}")
    }
}

pub fn parse_xml_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed == "1" || trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed == "0" || trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Inverse of [`Value::render`] for the given kind. `None` means the text is malformed.
pub fn parse_scalar(kind: ScalarKind, raw: &str) -> Option<Value> {
    match kind {
        ScalarKind::Bool => parse_xml_bool(raw).map(Value::Bool),
        ScalarKind::Int => raw.trim().parse::<i64>().ok().map(Value::Int),
        ScalarKind::Float => parse_xml_float(raw).map(Value::Float),
        ScalarKind::Text | ScalarKind::Relation => Some(Value::Text(raw.to_string())),
    }
}

fn parse_xml_float(raw: &str) -> Option<f64> {
    match raw.trim() {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        trimmed => trimmed.parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_render_as_digits() {
        assert_eq!(Value::Bool(true).render().as_deref(), Some("1"));
        assert_eq!(Value::Bool(false).render().as_deref(), Some("0"));
        assert_eq!(parse_scalar(ScalarKind::Bool, "1"), Some(Value::Bool(true)));
        assert_eq!(parse_scalar(ScalarKind::Bool, " true "), Some(Value::Bool(true)));
        assert_eq!(parse_scalar(ScalarKind::Bool, "0"), Some(Value::Bool(false)));
        assert_eq!(parse_scalar(ScalarKind::Bool, "yes"), None);
    }

    #[test]
    fn floats_use_canonical_decimal_text() {
        assert_eq!(format_float(0.2), "0.2");
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(-0.0), "0");
        assert_eq!(format_float(0.316588716), "0.316588716");
        assert_eq!(format_float(1e21), "1e21");
        assert_eq!(format_float(1.5e-9), "1.5e-9");
        assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
    }

    #[test]
    fn numeric_parsing_rejects_garbage() {
        assert_eq!(parse_scalar(ScalarKind::Int, " 42 "), Some(Value::Int(42)));
        assert_eq!(parse_scalar(ScalarKind::Int, "4.2"), None);
        assert_eq!(parse_scalar(ScalarKind::Float, "abc"), None);
        assert_eq!(parse_scalar(ScalarKind::Float, "1e21"), Some(Value::Float(1e21)));
        assert_eq!(
            parse_scalar(ScalarKind::Float, "INF"),
            Some(Value::Float(f64::INFINITY))
        );
    }
}
