use std::fmt;

/// Input that was tolerated but not understood while converting a tree.
///
/// Warnings never abort a parse. They exist so that dropped content stays observable: callers can
/// aggregate them across a whole document before deciding whether to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownContentWarning {
    /// An attribute that no field of the element's schema declares.
    UnrecognizedAttribute { element: String, attr: String },

    /// A child element that no field of the parent's schema declares. The child is skipped.
    UnrecognizedElement { parent: String, element: String },

    /// A well-formed value that a schema-specific "known values" check does not recognize.
    UnrecognizedValue {
        element: String,
        field: String,
        value: String,
    },
}

impl fmt::Display for UnknownContentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownContentWarning::UnrecognizedAttribute { element, attr } => {
                write!(f, "unrecognized attribute `{attr}` on <{element}>")
            }
            UnknownContentWarning::UnrecognizedElement { parent, element } => {
                write!(f, "unrecognized child <{element}> in <{parent}>")
            }
            UnknownContentWarning::UnrecognizedValue {
                element,
                field,
                value,
            } => write!(f, "unrecognized value `{value}` for <{element}> field `{field}`"),
        }
    }
}
