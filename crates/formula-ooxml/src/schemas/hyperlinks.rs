//! Worksheet `<hyperlinks>`.
//!
//! External targets live in the worksheet's relationships part; a hyperlink only carries the
//! `r:id`. Internal links use `location` instead.

use crate::error::ValidationError;
use crate::field::Field;
use crate::namespaces::SHEET_MAIN_NS;
use crate::schema::{Record, Schema};

pub static HYPERLINK: Schema = Schema {
    attributes: &[
        Field::text("ref"),
        Field::text("location").optional(),
        Field::text("tooltip").optional(),
        Field::text("display").optional(),
        Field::relation("id"),
    ],
    ..Schema::new("hyperlink")
};

pub static HYPERLINKS: Schema = Schema {
    namespace: Some(SHEET_MAIN_NS),
    elements: &[Field::sequence("hyperlink", &HYPERLINK)],
    ..Schema::new("hyperlinks")
};

/// Append `link`, assigning `rId{n}` (its 1-based position) when it has no relationship id.
pub fn append_hyperlink(list: &mut Record, mut link: Record) -> Result<(), ValidationError> {
    if link.get_str("id").is_none() {
        let position = list.get_list("hyperlink").len() + 1;
        link.set("id", format!("rId{position}"))?;
    }
    list.push("hyperlink", link)
}
