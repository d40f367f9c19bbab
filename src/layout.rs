//! Declarative record layouts.
//!
//! A [`Layout`] lists the fields of a record in declared order, each placed
//! at a word index, a bit offset and a width. Layouts are `const` values:
//! [`Layout::new`] checks placement at compile time, so a layout that
//! overlaps fields or straddles a word boundary does not build.

use crate::bitfield::MAX_SIGNED_BITS;
use crate::clip::ClipFormat;
use crate::error::PackError;
use crate::word::{U256, WORD_BITS};

/// How a field's bits are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Unsigned integer stored verbatim.
    Unsigned,
    /// Two's-complement integer stored verbatim.
    Signed,
    /// Monetary amount stored as a packed mantissa and exponent.
    Clipped(ClipFormat),
}

/// Placement of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    /// Field name, used for error attribution.
    pub name: &'static str,
    /// Index of the word holding the field.
    pub word: usize,
    /// Offset of the field's least significant bit.
    pub offset: u32,
    /// Width in bits.
    pub width: u32,
    /// Encoding of the field.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// An unsigned field.
    pub const fn unsigned(name: &'static str, word: usize, offset: u32, width: u32) -> Self {
        Self {
            name,
            word,
            offset,
            width,
            kind: FieldKind::Unsigned,
        }
    }

    /// A signed field.
    pub const fn signed(name: &'static str, word: usize, offset: u32, width: u32) -> Self {
        Self {
            name,
            word,
            offset,
            width,
            kind: FieldKind::Signed,
        }
    }

    /// A clipped field; its width is the format's width.
    pub const fn clipped(name: &'static str, word: usize, offset: u32, format: ClipFormat) -> Self {
        Self {
            name,
            word,
            offset,
            width: format.width(),
            kind: FieldKind::Clipped(format),
        }
    }

    /// Bit range `[offset, offset + width)`.
    #[inline]
    pub const fn end(&self) -> u32 {
        self.offset + self.width
    }
}

/// A field value, in the representation its [`FieldKind`] expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Value of an unsigned field.
    Unsigned(U256),
    /// Value of a signed field.
    Signed(i128),
    /// Value of a clipped field.
    Amount(U256),
}

impl FieldValue {
    /// Name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Unsigned(_) => "unsigned",
            FieldValue::Signed(_) => "signed",
            FieldValue::Amount(_) => "amount",
        }
    }

    /// The unsigned value, if this is one.
    pub fn as_unsigned(&self) -> Result<U256, PackError> {
        match self {
            FieldValue::Unsigned(v) => Ok(*v),
            other => Err(kind_mismatch("unsigned", other)),
        }
    }

    /// The signed value, if this is one.
    pub fn as_signed(&self) -> Result<i128, PackError> {
        match self {
            FieldValue::Signed(v) => Ok(*v),
            other => Err(kind_mismatch("signed", other)),
        }
    }

    /// The amount, if this is one.
    pub fn as_amount(&self) -> Result<U256, PackError> {
        match self {
            FieldValue::Amount(v) => Ok(*v),
            other => Err(kind_mismatch("amount", other)),
        }
    }

    /// An unsigned value narrowed to `u128`.
    pub fn as_u128(&self) -> Result<u128, PackError> {
        self.as_unsigned()?
            .to_u128()
            .ok_or(PackError::FieldOverflow { width: 128 })
    }

    /// An unsigned value narrowed to `u32`.
    pub fn as_u32(&self) -> Result<u32, PackError> {
        u32::try_from(self.as_u128()?).map_err(|_| PackError::FieldOverflow { width: 32 })
    }
}

fn kind_mismatch(expected: &str, found: &FieldValue) -> PackError {
    PackError::LayoutError(format!(
        "expected {} value, found {}",
        expected,
        found.kind_name()
    ))
}

/// The fixed layout of one record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    name: &'static str,
    words: usize,
    fields: &'static [FieldSpec],
}

impl Layout {
    /// Create a layout of `words` words.
    ///
    /// # Panics
    ///
    /// Panics if a field has zero width, extends past its word, refers to a
    /// word past `words`, is a signed field wider than 128 bits, is a
    /// clipped field whose width differs from its format, or overlaps another
    /// field. In a `const` context these are compile-time errors.
    pub const fn new(name: &'static str, words: usize, fields: &'static [FieldSpec]) -> Self {
        assert!(words > 0, "layout must have at least one word");

        let mut i = 0;
        while i < fields.len() {
            let field = &fields[i];
            assert!(field.width > 0, "field width must be > 0");
            assert!(field.word < words, "field word index out of range");
            assert!(
                field.width <= WORD_BITS && field.offset <= WORD_BITS - field.width,
                "field exceeds word bounds"
            );
            match field.kind {
                FieldKind::Signed => {
                    assert!(field.width <= MAX_SIGNED_BITS, "signed field too wide")
                }
                FieldKind::Clipped(format) => {
                    assert!(field.width == format.width(), "clipped width mismatch")
                }
                FieldKind::Unsigned => {}
            }

            let mut j = i + 1;
            while j < fields.len() {
                let other = &fields[j];
                if other.word == field.word {
                    assert!(
                        field.end() <= other.offset || other.end() <= field.offset,
                        "fields overlap"
                    );
                }
                j += 1;
            }
            i += 1;
        }

        Self {
            name,
            words,
            fields,
        }
    }

    /// Record type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of words a record occupies.
    #[inline]
    pub const fn words(&self) -> usize {
        self.words
    }

    /// Fields in declared order.
    #[inline]
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Bits occupied by fields in word `word`.
    pub fn used_bits(&self, word: usize) -> u32 {
        self.fields
            .iter()
            .filter(|f| f.word == word)
            .map(|f| f.width)
            .sum()
    }
}
