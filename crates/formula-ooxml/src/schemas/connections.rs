//! External data connections (`xl/connections.xml`).
//!
//! Unknown connection `type` codes are tolerated: they parse, round-trip, and are reported as
//! [`UnknownContentWarning::UnrecognizedValue`] so a caller can decide to reject the document.

use log::warn;

use crate::error::Result;
use crate::field::{DefaultValue, Field};
use crate::namespaces::SHEET_MAIN_NS;
use crate::schema::{Record, Schema};
use crate::tree::{from_tree_with_options, Parsed, ReadOptions};
use crate::validators::Validator;
use crate::value::ScalarKind;
use crate::warning::UnknownContentWarning;
use crate::xml::XmlElement;

/// Connection `type` codes Excel documents, with their descriptions.
pub const CONNECTION_TYPES: &[(i64, &str)] = &[
    (1, "ODBC-based source"),
    (2, "DAO-based source"),
    (3, "File based database source"),
    (4, "Web query"),
    (5, "OLE DB-based source"),
    (6, "Text-based source"),
    (7, "ADO record set"),
    (8, "DSP"),
];

const CREDENTIALS: &[Validator] = &[Validator::OneOf(&["integrated", "none", "stored", "prompt"])];
const HTML_FORMAT: &[Validator] = &[Validator::OneOf(&["none", "rtf", "all"])];
const FILE_TYPE: &[Validator] = &[Validator::OneOf(&["mac", "win", "dos", "lin", "other"])];
const QUALIFIER: &[Validator] = &[Validator::OneOf(&["doubleQuote", "singleQuote", "none"])];
const TEXT_FIELD_TYPE: &[Validator] = &[Validator::OneOf(&[
    "general", "text", "MDY", "DMY", "YMD", "MYD", "DYM", "YDM", "skip", "EMD",
])];
const PARAMETER_TYPE: &[Validator] = &[Validator::OneOf(&["prompt", "value", "cell"])];
const NON_NEGATIVE: &[Validator] = &[Validator::min_int(0)];

pub static DB_PR: Schema = Schema {
    attributes: &[
        Field::text("connection"),
        Field::text("command").optional(),
        Field::text("serverCommand").optional(),
        Field::int("commandType").optional(),
    ],
    ..Schema::new("dbPr")
};

pub static OLAP_PR: Schema = Schema {
    attributes: &[
        Field::bool("local")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::text("localConnection").optional(),
        Field::bool("localRefresh")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
        Field::bool("sendLocale").with_default(DefaultValue::Bool(false)),
        Field::int("rowDrillCount").optional(),
        Field::bool("serverFill")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
        Field::bool("serverNumberFormat")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
        Field::bool("serverFont")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
        Field::bool("serverFontColor")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
    ],
    ..Schema::new("olapPr")
};

pub static TABLE_MISSING: Schema = Schema::new("tableMissing");

pub static TABLES: Schema = Schema {
    attributes: &[Field::int("count").validate(NON_NEGATIVE).optional()],
    elements: &[
        Field::typed("m", &TABLE_MISSING).optional(),
        Field::nested_value("s", ScalarKind::Text)
            .value_attr("v")
            .optional(),
        Field::nested_value("e", ScalarKind::Text)
            .value_attr("v")
            .optional(),
        Field::nested_value("x", ScalarKind::Int)
            .value_attr("v")
            .optional(),
    ],
    ..Schema::new("tables")
};

pub static WEB_PR: Schema = Schema {
    attributes: &[
        Field::bool("xml").with_default(DefaultValue::Bool(false)),
        Field::bool("sourceData")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("parsePre")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("consecutive")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("firstRow").with_default(DefaultValue::Bool(false)),
        Field::bool("xl97")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("textDates")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("xl2000")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::text("url").optional(),
        Field::text("post").optional(),
        Field::bool("htmlTables").with_default(DefaultValue::Bool(false)),
        Field::text("htmlFormat").validate(HTML_FORMAT).optional(),
        Field::text("editPage").optional(),
    ],
    elements: &[Field::typed("tables", &TABLES).optional()],
    ..Schema::new("webPr")
};

pub static TEXT_FIELD: Schema = Schema {
    attributes: &[
        Field::text("type")
            .validate(TEXT_FIELD_TYPE)
            .with_default(DefaultValue::Text("general")),
        Field::int("position")
            .validate(NON_NEGATIVE)
            .with_default(DefaultValue::Int(0))
            .keep_default(),
    ],
    ..Schema::new("textField")
};

pub static TEXT_FIELDS: Schema = Schema {
    attributes: &[Field::int("count").validate(NON_NEGATIVE).optional()],
    elements: &[Field::sequence("textField", &TEXT_FIELD)],
    ..Schema::new("textFields")
};

pub static TEXT_PR: Schema = Schema {
    attributes: &[
        Field::bool("prompt").with_default(DefaultValue::Bool(true)),
        Field::text("fileType")
            .validate(FILE_TYPE)
            .with_default(DefaultValue::Text("win"))
            .keep_default(),
        Field::int("codePage").with_default(DefaultValue::Int(2)),
        Field::text("characterSet").optional(),
        Field::int("firstRow")
            .with_default(DefaultValue::Int(1))
            .keep_default(),
        Field::text("sourceFile").optional(),
        Field::bool("delimited")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
        Field::text("decimal")
            .with_default(DefaultValue::Text("."))
            .keep_default(),
        Field::text("thousands")
            .with_default(DefaultValue::Text(","))
            .keep_default(),
        Field::bool("tab")
            .with_default(DefaultValue::Bool(true))
            .keep_default(),
        Field::bool("space")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("comma")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("semicolon")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("consecutive")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::text("qualifier")
            .validate(QUALIFIER)
            .with_default(DefaultValue::Text("doubleQuote"))
            .keep_default(),
        Field::text("delimiter").optional(),
    ],
    elements: &[Field::typed("textFields", &TEXT_FIELDS).optional()],
    ..Schema::new("textPr")
};

pub static PARAMETER: Schema = Schema {
    attributes: &[
        Field::text("name").optional(),
        Field::int("sqlType").with_default(DefaultValue::Int(0)),
        Field::text("parameterType")
            .validate(PARAMETER_TYPE)
            .with_default(DefaultValue::Text("prompt"))
            .keep_default(),
        Field::bool("refreshOnChange")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::text("prompt").optional(),
        Field::bool("boolean").optional(),
        Field::float("double").optional(),
        Field::int("integer").optional(),
        Field::text("string").optional(),
        Field::text("cell").optional(),
    ],
    ..Schema::new("parameter")
};

pub static PARAMETERS: Schema = Schema {
    attributes: &[Field::int("count").validate(NON_NEGATIVE).optional()],
    elements: &[Field::sequence("parameter", &PARAMETER)],
    ..Schema::new("parameters")
};

pub static CONNECTION: Schema = Schema {
    attributes: &[
        Field::int("id"),
        Field::text("sourceFile").optional(),
        Field::text("odcFile").optional(),
        Field::bool("keepAlive")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::int("interval")
            .validate(NON_NEGATIVE)
            .with_default(DefaultValue::Int(0))
            .keep_default(),
        Field::text("name").optional(),
        Field::text("description").optional(),
        Field::int("type").optional(),
        Field::int("reconnectionMethod")
            .with_default(DefaultValue::Int(1))
            .keep_default(),
        Field::int("refreshedVersion"),
        Field::int("minRefreshableVersion")
            .with_default(DefaultValue::Int(0))
            .keep_default(),
        Field::bool("savePassword")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("new")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("deleted")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("onlyUseConnectionFile")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("background")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("refreshOnLoad")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::bool("saveData")
            .with_default(DefaultValue::Bool(false))
            .keep_default(),
        Field::text("credentials")
            .validate(CREDENTIALS)
            .with_default(DefaultValue::Text("integrated"))
            .keep_default(),
        Field::text("singleSignOnId").optional(),
    ],
    elements: &[
        Field::typed("dbPr", &DB_PR).optional(),
        Field::typed("olapPr", &OLAP_PR).optional(),
        Field::typed("webPr", &WEB_PR).optional(),
        Field::typed("textPr", &TEXT_PR).optional(),
        Field::typed("parameters", &PARAMETERS).optional(),
    ],
    ..Schema::new("connection")
};

pub static CONNECTIONS: Schema = Schema {
    namespace: Some(SHEET_MAIN_NS),
    elements: &[Field::sequence("connection", &CONNECTION)],
    ..Schema::new("connections")
};

pub fn connection_type_description(code: i64) -> Option<&'static str> {
    CONNECTION_TYPES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| *description)
}

/// Whether the connection declares one of the documented `type` codes.
pub fn is_known_connection(connection: &Record) -> bool {
    connection
        .get_int("type")
        .and_then(connection_type_description)
        .is_some()
}

/// One warning per connection whose `type` is set but undocumented. Connections without a `type`
/// are not flagged.
pub fn validate_connection_types(connections: &Record) -> Vec<UnknownContentWarning> {
    let mut warnings = Vec::new();
    for connection in connections.records("connection") {
        let Some(code) = connection.get_int("type") else {
            continue;
        };
        if connection_type_description(code).is_none() {
            warn!(
                "connection {} has unknown type {code}",
                connection.get_int("id").unwrap_or_default()
            );
            warnings.push(UnknownContentWarning::UnrecognizedValue {
                element: connection.tagname().to_string(),
                field: "type".to_string(),
                value: code.to_string(),
            });
        }
    }
    warnings
}

/// Parse `<connections>` and append connection-type warnings to the unknown-content ones.
pub fn parse_connections(node: &XmlElement) -> Result<Parsed> {
    let mut parsed = from_tree_with_options(&CONNECTIONS, node, &ReadOptions::default())?;
    let type_warnings = validate_connection_types(&parsed.record);
    parsed.warnings.extend(type_warnings);
    Ok(parsed)
}
