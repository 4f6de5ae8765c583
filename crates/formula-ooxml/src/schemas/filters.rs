//! Worksheet AutoFilter (`<autoFilter>`) and sort state (`<sortState>`) schemas.

use crate::error::ValidationError;
use crate::field::{DefaultValue, Field};
use crate::namespaces::SHEET_MAIN_NS;
use crate::schema::{Record, Schema};
use crate::validators::{pattern_matches, Validator};
use crate::value::{format_float, parse_scalar, ScalarKind, Value};

/// A cell reference or range in A1 notation (`B1`, `A2:$C$10`).
const A1_REF: &[Validator] = &[Validator::Pattern(
    r"^\$?[A-Za-z]{1,3}\$?[0-9]+(:\$?[A-Za-z]{1,3}\$?[0-9]+)?$",
)];

/// Wildcard placement Excel requires for string custom filters.
pub const STRING_FILTER_PATTERN: &str = r"(^\*.*)|(.*\*$)";

const CUSTOM_FILTER_OPERATORS: &[&str] = &[
    "equal",
    "lessThan",
    "lessThanOrEqual",
    "notEqual",
    "greaterThanOrEqual",
    "greaterThan",
];
const STRING_OPERATORS: &[&str] = &["equal", "notEqual"];
const BLANK_OPERATORS: &[&str] = &["notEqual"];

const OPERATOR: &[Validator] = &[Validator::OneOf(CUSTOM_FILTER_OPERATORS)];
const CALENDAR_TYPE: &[Validator] = &[Validator::OneOf(&[
    "gregorian",
    "gregorianUs",
    "gregorianMeFrench",
    "gregorianArabic",
    "hijri",
    "hebrew",
    "taiwan",
    "japan",
    "thai",
    "korea",
    "saka",
    "gregorianXlitEnglish",
    "gregorianXlitFrench",
])];
const DATE_TIME_GROUPING: &[Validator] = &[Validator::OneOf(&[
    "year", "month", "day", "hour", "minute", "second",
])];
const DYNAMIC_FILTER_TYPE: &[Validator] = &[Validator::OneOf(&[
    "null",
    "aboveAverage",
    "belowAverage",
    "tomorrow",
    "today",
    "yesterday",
    "nextWeek",
    "thisWeek",
    "lastWeek",
    "nextMonth",
    "thisMonth",
    "lastMonth",
    "nextQuarter",
    "thisQuarter",
    "lastQuarter",
    "nextYear",
    "thisYear",
    "lastYear",
    "yearToDate",
    "Q1",
    "Q2",
    "Q3",
    "Q4",
    "M1",
    "M2",
    "M3",
    "M4",
    "M5",
    "M6",
    "M7",
    "M8",
    "M9",
    "M10",
    "M11",
    "M12",
])];
const ICON_SET: &[Validator] = &[Validator::OneOf(&[
    "3Arrows",
    "3ArrowsGray",
    "3Flags",
    "3TrafficLights1",
    "3TrafficLights2",
    "3Signs",
    "3Symbols",
    "3Symbols2",
    "4Arrows",
    "4ArrowsGray",
    "4RedToBlack",
    "4Rating",
    "4TrafficLights",
    "5Arrows",
    "5ArrowsGray",
    "5Rating",
    "5Quarters",
])];
const SORT_BY: &[Validator] = &[Validator::OneOf(&["value", "cellColor", "fontColor", "icon"])];
const SORT_METHOD: &[Validator] = &[Validator::OneOf(&["stroke", "pinYin"])];

const NON_NEGATIVE: &[Validator] = &[Validator::min_int(0)];
const MONTH: &[Validator] = &[Validator::int_range(1, 12)];
const DAY: &[Validator] = &[Validator::int_range(1, 31)];
const HOUR: &[Validator] = &[Validator::int_range(0, 23)];
const MINUTE_OR_SECOND: &[Validator] = &[Validator::int_range(0, 59)];
const AT_MOST_TWO: &[Validator] = &[Validator::max_len(2)];
const AT_MOST_64: &[Validator] = &[Validator::max_len(64)];

pub static SORT_CONDITION: Schema = Schema {
    attributes: &[
        Field::bool("descending").with_default(DefaultValue::Bool(false)),
        Field::text("sortBy").validate(SORT_BY).optional(),
        Field::text("ref").validate(A1_REF),
        Field::text("customList").optional(),
        Field::int("dxfId").validate(NON_NEGATIVE).optional(),
        Field::text("iconSet").validate(ICON_SET).optional(),
        Field::int("iconId").validate(NON_NEGATIVE).optional(),
    ],
    ..Schema::new("sortCondition")
};

pub static SORT_STATE: Schema = Schema {
    namespace: Some(SHEET_MAIN_NS),
    attributes: &[
        Field::bool("columnSort").with_default(DefaultValue::Bool(false)),
        Field::bool("caseSensitive").with_default(DefaultValue::Bool(false)),
        Field::text("sortMethod").validate(SORT_METHOD).optional(),
        Field::text("ref").validate(A1_REF),
    ],
    elements: &[Field::sequence("sortCondition", &SORT_CONDITION).validate(AT_MOST_64)],
    ..Schema::new("sortState")
};

pub static DATE_GROUP_ITEM: Schema = Schema {
    attributes: &[
        Field::int("year"),
        Field::int("month").validate(MONTH).optional(),
        Field::int("day").validate(DAY).optional(),
        Field::int("hour").validate(HOUR).optional(),
        Field::int("minute").validate(MINUTE_OR_SECOND).optional(),
        Field::int("second").validate(MINUTE_OR_SECOND).optional(),
        Field::text("dateTimeGrouping").validate(DATE_TIME_GROUPING),
    ],
    ..Schema::new("dateGroupItem")
};

pub static FILTERS: Schema = Schema {
    attributes: &[
        Field::bool("blank").with_default(DefaultValue::Bool(false)),
        Field::text("calendarType").validate(CALENDAR_TYPE).optional(),
    ],
    elements: &[
        Field::value_sequence("filter", ScalarKind::Text),
        Field::sequence("dateGroupItem", &DATE_GROUP_ITEM),
    ],
    ..Schema::new("filters")
};

pub static TOP10: Schema = Schema {
    attributes: &[
        Field::bool("top").with_default(DefaultValue::Bool(true)),
        Field::bool("percent").with_default(DefaultValue::Bool(false)),
        Field::float("val"),
        Field::float("filterVal").optional(),
    ],
    ..Schema::new("top10")
};

pub static CUSTOM_FILTER: Schema = Schema {
    attributes: &[
        Field::text("operator")
            .validate(OPERATOR)
            .with_default(DefaultValue::Text("equal"))
            .keep_default(),
        Field::text("val"),
    ],
    check: Some(check_custom_filter),
    ..Schema::new("customFilter")
};

pub static CUSTOM_FILTERS: Schema = Schema {
    attributes: &[Field::bool("and").with_default(DefaultValue::Bool(false))],
    elements: &[Field::sequence("customFilter", &CUSTOM_FILTER).validate(AT_MOST_TWO)],
    ..Schema::new("customFilters")
};

pub static DYNAMIC_FILTER: Schema = Schema {
    attributes: &[
        Field::text("type").validate(DYNAMIC_FILTER_TYPE),
        Field::float("val").optional(),
        Field::text("valIso").optional(),
        Field::float("maxVal").optional(),
        Field::text("maxValIso").optional(),
    ],
    ..Schema::new("dynamicFilter")
};

pub static COLOR_FILTER: Schema = Schema {
    attributes: &[
        Field::int("dxfId").validate(NON_NEGATIVE).optional(),
        Field::bool("cellColor").optional(),
    ],
    ..Schema::new("colorFilter")
};

pub static ICON_FILTER: Schema = Schema {
    attributes: &[
        Field::text("iconSet").validate(ICON_SET),
        Field::int("iconId").validate(NON_NEGATIVE).optional(),
    ],
    ..Schema::new("iconFilter")
};

pub static FILTER_COLUMN: Schema = Schema {
    attributes: &[
        Field::int("colId").validate(NON_NEGATIVE),
        Field::bool("hiddenButton")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("showButton")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
    ],
    elements: &[
        Field::typed("filters", &FILTERS).optional(),
        Field::typed("top10", &TOP10).optional(),
        Field::typed("customFilters", &CUSTOM_FILTERS).optional(),
        Field::typed("dynamicFilter", &DYNAMIC_FILTER).optional(),
        Field::typed("colorFilter", &COLOR_FILTER).optional(),
        Field::typed("iconFilter", &ICON_FILTER).optional(),
    ],
    choices: &[&[
        "filters",
        "top10",
        "customFilters",
        "dynamicFilter",
        "colorFilter",
        "iconFilter",
    ]],
    ..Schema::new("filterColumn")
};

pub static AUTO_FILTER: Schema = Schema {
    namespace: Some(SHEET_MAIN_NS),
    attributes: &[Field::text("ref").validate(A1_REF).optional()],
    elements: &[
        Field::sequence("filterColumn", &FILTER_COLUMN),
        Field::typed("sortState", &SORT_STATE).optional(),
    ],
    ..Schema::new("autoFilter")
};

/// Numeric values accept every operator. A single space means "blank" and only works with
/// `notEqual`. Any other string is a wildcard match: `equal`/`notEqual` with a leading or trailing
/// `*`.
fn check_custom_filter(record: &Record) -> Result<(), ValidationError> {
    let Some(val) = record.get_str("val") else {
        return Ok(());
    };
    let operator = record.get_str("operator").unwrap_or("equal");

    if parse_scalar(ScalarKind::Float, val).is_some() {
        return Ok(());
    }

    let allowed = if val == " " {
        BLANK_OPERATORS
    } else {
        STRING_OPERATORS
    };
    if !allowed.contains(&operator) {
        return Err(ValidationError::NotAllowed {
            field: "operator",
            value: operator.to_string(),
            allowed,
        });
    }

    if val != " " && !pattern_matches("val", STRING_FILTER_PATTERN, val)? {
        return Err(ValidationError::PatternMismatch {
            field: "val",
            value: val.to_string(),
            pattern: STRING_FILTER_PATTERN,
        });
    }
    Ok(())
}

/// Translate a text-match operator into the wildcard form Excel stores.
///
/// `beginsWith`/`contains`/`endsWith` become `equal` and their negations become `notEqual`.
pub fn string_filter_value(
    operator: &str,
    val: &str,
) -> Result<(&'static str, String), ValidationError> {
    let translated = match operator {
        "beginsWith" => ("equal", format!("{val}*")),
        "doesNotBeginWith" => ("notEqual", format!("{val}*")),
        "contains" => ("equal", format!("*{val}*")),
        "doesNotContain" => ("notEqual", format!("*{val}*")),
        "endsWith" => ("equal", format!("*{val}")),
        "doesNotEndWith" => ("notEqual", format!("*{val}")),
        _ => {
            return Err(ValidationError::UnsupportedOperator {
                operator: operator.to_string(),
            })
        }
    };
    Ok(translated)
}

pub fn custom_filter(operator: &str, val: &str) -> Result<Record, ValidationError> {
    Record::build(&CUSTOM_FILTER, [("operator", operator), ("val", val)])
}

pub fn number_filter(operator: &str, val: f64) -> Result<Record, ValidationError> {
    custom_filter(operator, &format_float(val))
}

/// `<customFilter operator="notEqual" val=" "/>`: match non-blank cells.
pub fn blank_filter() -> Result<Record, ValidationError> {
    custom_filter("notEqual", " ")
}

/// Custom filter from a text-match operator such as `contains`.
pub fn string_filter(operator: &str, val: &str) -> Result<Record, ValidationError> {
    let (operator, val) = string_filter_value(operator, val)?;
    custom_filter(operator, &val)
}

pub fn auto_filter(reference: &str) -> Result<Record, ValidationError> {
    Record::build(&AUTO_FILTER, [("ref", reference)])
}

/// Append a value-list filter for column `col_id`.
pub fn add_filter_column(
    auto_filter: &mut Record,
    col_id: u32,
    vals: &[&str],
    blank: bool,
) -> Result<(), ValidationError> {
    let mut filters = Record::new(&FILTERS);
    filters.set("blank", blank)?;
    for val in vals {
        filters.push("filter", *val)?;
    }
    let column = Record::build(
        &FILTER_COLUMN,
        [("colId", Value::from(col_id)), ("filters", Value::from(filters))],
    )?;
    auto_filter.push("filterColumn", column)
}

/// Append a sort condition, creating `<sortState>` over the filter's range on first use.
pub fn add_sort_condition(
    auto_filter: &mut Record,
    reference: &str,
    descending: bool,
) -> Result<(), ValidationError> {
    let condition = Record::build(
        &SORT_CONDITION,
        [("ref", Value::from(reference)), ("descending", Value::from(descending))],
    )?;

    if let Some(state) = auto_filter.get_record_mut("sortState") {
        return state.push("sortCondition", condition);
    }

    let range = auto_filter
        .get_str("ref")
        .ok_or(ValidationError::Required { field: "ref" })?
        .to_string();
    let mut state = Record::build(&SORT_STATE, [("ref", range)])?;
    state.push("sortCondition", condition)?;
    auto_filter.set("sortState", state)
}

/// An auto-filter without a range does nothing and is not written by Excel.
pub fn is_active(auto_filter: &Record) -> bool {
    auto_filter.get_str("ref").is_some()
}
