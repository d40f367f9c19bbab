//! Error types for packing and unpacking records.

use thiserror::Error;

/// Errors that can occur while packing or unpacking words.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackError {
    /// A value does not fit in the bit width allotted to it.
    #[error("value does not fit in {width} bits")]
    FieldOverflow {
        /// Width of the field that rejected the value.
        width: u32,
    },

    /// A field placement, value list or word sequence does not match the
    /// layout it is used with.
    #[error("layout error: {0}")]
    LayoutError(String),

    /// A monetary amount is wider than the clipped representation can hold.
    #[error("amount of {bits} bits exceeds the clipped maximum of {max_bits} bits")]
    ClipOverflow {
        /// Significant bits of the rejected amount.
        bits: u32,
        /// Widest amount the clip format can represent.
        max_bits: u32,
    },

    /// An error attributed to a named record field.
    #[error("field `{field}`: {source}")]
    Field {
        /// Name of the field being packed or unpacked.
        field: &'static str,
        /// The underlying error.
        source: Box<PackError>,
    },

    /// A numeric literal could not be parsed.
    #[error("invalid numeric literal: {0:?}")]
    InvalidLiteral(String),

    /// An address literal could not be parsed.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
}

impl PackError {
    /// Attribute this error to a record field.
    pub fn in_field(self, field: &'static str) -> Self {
        PackError::Field {
            field,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any field attribution removed.
    pub fn root(&self) -> &PackError {
        match self {
            PackError::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// The name of the field this error is attributed to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PackError::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}
