//! Schema-driven OOXML element serialization.
//!
//! SpreadsheetML elements are declared as `static` [`Schema`] tables: ordered attribute fields,
//! ordered element fields, a tag name and namespace. A [`Record`] holds one value per field and
//! validates every assignment eagerly, so an invalid record cannot be constructed. The [`tree`]
//! engine converts records to and from in-memory [`XmlElement`] trees:
//!
//! - [`to_tree`] writes attributes and children in declared order, eliding defaults.
//! - [`from_tree`] parses a tree back, reporting unknown attributes and children as
//!   [`UnknownContentWarning`]s instead of failing.
//!
//! Byte-level XML is handled at the edges: [`XmlElement::parse_str`] uses `roxmltree` and
//! [`XmlElement::to_xml_string`] uses `quick-xml`. Part schemas built on the core live in
//! [`schemas`].

pub mod compare;
mod error;
mod field;
mod namespaces;
mod schema;
pub mod schemas;
pub mod tree;
mod validators;
mod value;
mod warning;
mod xml;

pub use error::{Error, Result, ValidationError};
pub use field::{DefaultValue, Field, FieldKind};
pub use namespaces::{
    localname, NamespaceError, NamespaceRegistry, QName, DRAWING_NS, EXCEL_NS, MC_NS, OFFICE_NS,
    PKG_REL_NS, REL_NS, SHEET_DRAWING_NS, SHEET_MAIN_NS, VML_NS, XML_NS,
};
pub use schema::{Record, RecordCheck, Schema};
pub use tree::{
    from_tree, from_tree_with_options, from_tree_with_warnings, to_tree, to_tree_with_options,
    Parsed, ReadOptions, WriteOptions,
};
pub use validators::{check_all, pattern_matches, Validator};
pub use value::{format_float, parse_scalar, parse_xml_bool, ScalarKind, Value};
pub use warning::UnknownContentWarning;
pub use xml::XmlElement;
