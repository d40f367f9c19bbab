//! Record codec: packs field values into words according to a [`Layout`].
//!
//! ## Encoding Format
//!
//! A record occupies exactly [`Layout::words`] 256-bit words. Each field is
//! written at its declared word and bit offset (bit 0 is the least
//! significant bit); bits not covered by any field are zero. Unsigned fields
//! are stored verbatim, signed fields in two's complement, and clipped
//! fields as `exponent << mantissa_bits | mantissa` (see
//! [`ClipFormat::pack`](crate::ClipFormat::pack)).
//!
//! As bytes, each word is 32 bytes big-endian and words follow in index
//! order, which is how an EVM storage slot holds them.
//!
//! Encoding is all-or-nothing: words are built locally and returned only when
//! every field has been written.

use tracing::{debug, trace};

use crate::bitfield::{read_field, read_signed_field, write_field, write_signed_field};
use crate::error::PackError;
use crate::layout::{FieldKind, FieldSpec, FieldValue, Layout};
use crate::word::{U256, WORD_BYTES};

/// Pack `values`, given in the layout's declared field order.
///
/// # Errors
/// * [`PackError::LayoutError`] if the number or kind of values does not
///   match the layout.
/// * Any error from writing or clipping a field, wrapped in
///   [`PackError::Field`] with the field's name.
pub fn encode_fields(layout: &Layout, values: &[FieldValue]) -> Result<Vec<U256>, PackError> {
    let result = pack(layout, values);
    match &result {
        Ok(words) => trace!(layout = layout.name(), words = words.len(), "encoded record"),
        Err(err) => debug!(
            layout = layout.name(),
            field = err.field().unwrap_or("-"),
            error = %err,
            "failed to encode record"
        ),
    }
    result
}

/// Unpack the fields of one record, in declared order.
///
/// Every bit pattern is a valid input; the only failure is a word count that
/// differs from [`Layout::words`].
pub fn decode_fields(layout: &Layout, words: &[U256]) -> Result<Vec<FieldValue>, PackError> {
    let result = unpack(layout, words);
    match &result {
        Ok(values) => trace!(layout = layout.name(), fields = values.len(), "decoded record"),
        Err(err) => debug!(
            layout = layout.name(),
            field = err.field().unwrap_or("-"),
            error = %err,
            "failed to decode record"
        ),
    }
    result
}

fn pack(layout: &Layout, values: &[FieldValue]) -> Result<Vec<U256>, PackError> {
    if values.len() != layout.fields().len() {
        return Err(PackError::LayoutError(format!(
            "{} expects {} values, got {}",
            layout.name(),
            layout.fields().len(),
            values.len()
        )));
    }

    let mut words = vec![U256::ZERO; layout.words()];
    for (spec, value) in layout.fields().iter().zip(values) {
        let slot = words.get_mut(spec.word).ok_or_else(|| {
            PackError::LayoutError(format!("word {} out of range", spec.word)).in_field(spec.name)
        })?;
        *slot = write_value(*slot, spec, value).map_err(|e| e.in_field(spec.name))?;
    }
    Ok(words)
}

fn write_value(acc: U256, spec: &FieldSpec, value: &FieldValue) -> Result<U256, PackError> {
    match spec.kind {
        FieldKind::Unsigned => write_field(acc, value.as_unsigned()?, spec.width, spec.offset),
        FieldKind::Signed => write_signed_field(acc, value.as_signed()?, spec.width, spec.offset),
        FieldKind::Clipped(format) => {
            let packed = format.pack(value.as_amount()?)?;
            write_field(acc, packed, spec.width, spec.offset)
        }
    }
}

fn unpack(layout: &Layout, words: &[U256]) -> Result<Vec<FieldValue>, PackError> {
    if words.len() != layout.words() {
        return Err(PackError::LayoutError(format!(
            "{} expects {} words, got {}",
            layout.name(),
            layout.words(),
            words.len()
        )));
    }

    layout
        .fields()
        .iter()
        .map(|spec| read_value(words, spec).map_err(|e| e.in_field(spec.name)))
        .collect()
}

fn read_value(words: &[U256], spec: &FieldSpec) -> Result<FieldValue, PackError> {
    let word = *words
        .get(spec.word)
        .ok_or_else(|| PackError::LayoutError(format!("word {} out of range", spec.word)))?;

    Ok(match spec.kind {
        FieldKind::Unsigned => FieldValue::Unsigned(read_field(word, spec.width, spec.offset)?),
        FieldKind::Signed => FieldValue::Signed(read_signed_field(word, spec.width, spec.offset)?),
        FieldKind::Clipped(format) => {
            FieldValue::Amount(format.unpack(read_field(word, spec.width, spec.offset)?))
        }
    })
}

/// A record with a fixed packed layout.
///
/// Implementors describe how to turn themselves into field values and back;
/// the provided methods do the packing.
///
/// # Example
///
/// ```
/// use flow_pack::{FlowIndexData, PackedRecord, U256};
///
/// let index = FlowIndexData {
///     timestamp: 1_618_876_800,
///     flow_rate: 1_000_000_000_000_000_000,
///     deposit: U256::from(14_400_000_000_000_000_000_000u128),
///     owed_deposit: U256::ZERO,
///     total_units_pending: 1000,
///     total_units_approved: 1000,
/// };
///
/// let words = index.encode().unwrap();
/// assert_eq!(words.len(), 2);
///
/// let decoded = FlowIndexData::decode(&words).unwrap();
/// assert_eq!(decoded.timestamp, index.timestamp);
/// assert!(decoded.deposit <= index.deposit);
/// ```
pub trait PackedRecord: Sized {
    /// Layout shared by encode and decode.
    const LAYOUT: Layout;

    /// Field values in the layout's declared order.
    fn to_fields(&self) -> Vec<FieldValue>;

    /// Rebuild a record from values in the layout's declared order.
    fn from_fields(values: &[FieldValue]) -> Result<Self, PackError>;

    /// Pack this record into [`Layout::words`] words.
    fn encode(&self) -> Result<Vec<U256>, PackError> {
        encode_fields(&Self::LAYOUT, &self.to_fields())
    }

    /// Unpack a record. Clipped fields come back rounded toward zero.
    fn decode(words: &[U256]) -> Result<Self, PackError> {
        let values = decode_fields(&Self::LAYOUT, words)?;
        Self::from_fields(&values)
    }

    /// Pack this record into 32-byte big-endian words.
    fn encode_bytes(&self) -> Result<Vec<[u8; WORD_BYTES]>, PackError> {
        Ok(self.encode()?.into_iter().map(U256::to_be_bytes).collect())
    }

    /// Unpack a record from 32-byte big-endian words.
    fn decode_bytes(words: &[[u8; WORD_BYTES]]) -> Result<Self, PackError> {
        let words: Vec<U256> = words.iter().copied().map(U256::from_be_bytes).collect();
        Self::decode(&words)
    }
}

/// Take exactly `N` values from a decoded field list.
///
/// Used by [`PackedRecord::from_fields`] implementations to destructure the
/// list in one step.
pub fn fields_array<const N: usize>(
    layout: &Layout,
    values: &[FieldValue],
) -> Result<[FieldValue; N], PackError> {
    <[FieldValue; N]>::try_from(values).map_err(|_| {
        PackError::LayoutError(format!(
            "{} expects {} values, got {}",
            layout.name(),
            N,
            values.len()
        ))
    })
}
