//! Value constraints attached to fields.
//!
//! Validators run after type coercion, in declaration order; the first failure wins.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;

use crate::error::ValidationError;
use crate::value::{format_float, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validator {
    /// Inclusive integer bounds.
    IntRange { min: Option<i64>, max: Option<i64> },
    /// Inclusive float bounds.
    FloatRange { min: Option<f64>, max: Option<f64> },
    /// Exact, case-sensitive membership.
    OneOf(&'static [&'static str]),
    /// Regular expression the text must match.
    Pattern(&'static str),
    /// Inclusive bounds on the number of items in a list.
    Length { min: Option<usize>, max: Option<usize> },
}

impl Validator {
    pub const fn int_range(min: i64, max: i64) -> Self {
        Validator::IntRange {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn min_int(min: i64) -> Self {
        Validator::IntRange {
            min: Some(min),
            max: None,
        }
    }

    pub const fn float_range(min: f64, max: f64) -> Self {
        Validator::FloatRange {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn max_len(max: usize) -> Self {
        Validator::Length {
            min: None,
            max: Some(max),
        }
    }

    pub fn check(&self, field: &'static str, value: &Value) -> Result<(), ValidationError> {
        match *self {
            Validator::IntRange { min, max } => {
                let Value::Int(n) = value else {
                    return Ok(());
                };
                if min.is_some_and(|min| *n < min) || max.is_some_and(|max| *n > max) {
                    return Err(ValidationError::OutOfRange {
                        field,
                        value: n.to_string(),
                        min: min.map(|n| n.to_string()),
                        max: max.map(|n| n.to_string()),
                    });
                }
                Ok(())
            }
            Validator::FloatRange { min, max } => {
                let Some(n) = value.as_float() else {
                    return Ok(());
                };
                // NaN fails every bounded range.
                let below = min.is_some_and(|min| !(n >= min));
                let above = max.is_some_and(|max| !(n <= max));
                if below || above {
                    return Err(ValidationError::OutOfRange {
                        field,
                        value: format_float(n),
                        min: min.map(format_float),
                        max: max.map(format_float),
                    });
                }
                Ok(())
            }
            Validator::OneOf(allowed) => {
                let Value::Text(s) = value else {
                    return Ok(());
                };
                if allowed.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(ValidationError::NotAllowed {
                        field,
                        value: s.clone(),
                        allowed,
                    })
                }
            }
            Validator::Pattern(pattern) => {
                let Value::Text(s) = value else {
                    return Ok(());
                };
                if pattern_matches(field, pattern, s)? {
                    Ok(())
                } else {
                    Err(ValidationError::PatternMismatch {
                        field,
                        value: s.clone(),
                        pattern,
                    })
                }
            }
            Validator::Length { min, max } => {
                let Value::List(items) = value else {
                    return Ok(());
                };
                let len = items.len();
                if min.is_some_and(|min| len < min) || max.is_some_and(|max| len > max) {
                    return Err(ValidationError::Length {
                        field,
                        len,
                        min,
                        max,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Run `validators` in order, stopping at the first failure.
pub fn check_all(
    validators: &[Validator],
    field: &'static str,
    value: &Value,
) -> Result<(), ValidationError> {
    validators.iter().try_for_each(|v| v.check(field, value))
}

/// Match `text` against a schema-declared pattern. Compiled patterns are cached per process.
pub fn pattern_matches(
    field: &'static str,
    pattern: &'static str,
    text: &str,
) -> Result<bool, ValidationError> {
    static CACHE: OnceLock<Mutex<HashMap<&'static str, Regex>>> = OnceLock::new();

    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(re) = cache.get(pattern) {
        return Ok(re.is_match(text));
    }
    let re = Regex::new(pattern).map_err(|err| ValidationError::InvalidPattern {
        field,
        pattern,
        message: err.to_string(),
    })?;
    let matched = re.is_match(text);
    cache.insert(pattern, re);
    Ok(matched)
}
