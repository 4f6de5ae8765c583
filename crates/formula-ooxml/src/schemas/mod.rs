//! SpreadsheetML part schemas declared with the core field primitives.

pub mod connections;
pub mod controls;
pub mod filters;
pub mod hyperlinks;
