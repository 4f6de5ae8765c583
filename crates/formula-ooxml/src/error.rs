use thiserror::Error;

/// Result type for tree conversion.
pub type Result<T> = std::result::Result<T, Error>;

/// A value was rejected at assignment time.
///
/// Assignments are all-or-nothing: when a setter returns one of these, the record is left exactly
/// as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("`{schema}` has no field named `{field}`")]
    UnknownField {
        schema: &'static str,
        field: String,
    },

    #[error("field `{field}` expected {expected}, got {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field `{field}` expected an integer, got {value}")]
    NotIntegral { field: &'static str, value: f64 },

    #[error("field `{field}` value {value} is outside {}", fmt_bounds(.min, .max))]
    OutOfRange {
        field: &'static str,
        value: String,
        min: Option<String>,
        max: Option<String>,
    },

    #[error("field `{field}` value `{value}` must be one of {allowed:?}")]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("Value does not match pattern {pattern}")]
    PatternMismatch {
        field: &'static str,
        value: String,
        pattern: &'static str,
    },

    #[error("field `{field}` holds {len} items; expected {}", fmt_bounds(.min, .max))]
    Length {
        field: &'static str,
        len: usize,
        min: Option<usize>,
        max: Option<usize>,
    },

    #[error("field `{field}` is mandatory")]
    Required { field: &'static str },

    #[error("fields `{field}` and `{existing}` are mutually exclusive")]
    ChoiceConflict {
        field: &'static str,
        existing: &'static str,
    },

    #[error("Unsupported operator `{operator}`")]
    UnsupportedOperator { operator: String },

    #[error("invalid pattern `{pattern}` declared for field `{field}`: {message}")]
    InvalidPattern {
        field: &'static str,
        pattern: &'static str,
        message: String,
    },
}

fn fmt_bounds<T: std::fmt::Display>(min: &Option<T>, max: &Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("[{min}, {max}]"),
        (Some(min), None) => format!("[{min}, ..)"),
        (None, Some(max)) => format!("(.., {max}]"),
        (None, None) => "(.., ..)".to_string(),
    }
}

/// Errors returned while converting between XML trees and records.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("<{element}> field `{field}`: cannot parse `{raw}` as {expected}")]
    Parse {
        element: String,
        field: &'static str,
        raw: String,
        expected: &'static str,
    },

    #[error("expected <{expected}>, found <{found}>")]
    TagMismatch { expected: String, found: String },

    #[error("<{element}> is missing required attribute `{attr}`")]
    MissingAttribute {
        element: &'static str,
        attr: &'static str,
    },

    #[error("<{element}> is missing required child <{child}>")]
    MissingElement {
        element: &'static str,
        child: &'static str,
    },

    #[error("element nesting exceeds the maximum depth of {max}")]
    DepthLimit { max: usize },

    #[error("failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("failed to write XML: {0}")]
    Write(#[from] quick_xml::Error),
}
