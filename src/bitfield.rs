//! Bit field placement within a storage word.
//!
//! Fields are addressed by `(width, offset)` where `offset` counts from the
//! least significant bit. Writes are checked: a value wider than its field is
//! rejected, never masked.

use crate::error::PackError;
use crate::word::{U256, WORD_BITS};

/// Widest signed field supported.
pub const MAX_SIGNED_BITS: u32 = 128;

fn check_placement(width: u32, offset: u32) -> Result<(), PackError> {
    if width == 0 || width > WORD_BITS || offset > WORD_BITS - width {
        return Err(PackError::LayoutError(format!(
            "{} bits at offset {} do not fit a {}-bit word",
            width, offset, WORD_BITS
        )));
    }
    Ok(())
}

fn check_signed_width(width: u32) -> Result<(), PackError> {
    if width > MAX_SIGNED_BITS {
        return Err(PackError::LayoutError(format!(
            "signed field of {} bits exceeds maximum of {}",
            width, MAX_SIGNED_BITS
        )));
    }
    Ok(())
}

#[inline]
fn mask_u128(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Write the `width`-bit unsigned `value` at `offset` into `acc`.
///
/// Bits of `acc` outside the field are preserved; bits inside it are
/// replaced.
///
/// # Errors
/// * [`PackError::LayoutError`] if the field does not fit in the word.
/// * [`PackError::FieldOverflow`] if `value >= 2^width`.
pub fn write_field(acc: U256, value: U256, width: u32, offset: u32) -> Result<U256, PackError> {
    check_placement(width, offset)?;

    let mask = U256::low_mask(width);
    if value > mask {
        return Err(PackError::FieldOverflow { width });
    }

    let cleared = acc & !(mask << offset);
    Ok(cleared | (value << offset))
}

/// Read the `width`-bit unsigned field at `offset`.
pub fn read_field(word: U256, width: u32, offset: u32) -> Result<U256, PackError> {
    check_placement(width, offset)?;
    Ok((word >> offset) & U256::low_mask(width))
}

/// Write a two's-complement signed field.
///
/// # Errors
/// * [`PackError::LayoutError`] if the field does not fit in the word or is
///   wider than [`MAX_SIGNED_BITS`].
/// * [`PackError::FieldOverflow`] if `value` is outside
///   `[-2^(width-1), 2^(width-1))`.
pub fn write_signed_field(acc: U256, value: i128, width: u32, offset: u32) -> Result<U256, PackError> {
    check_placement(width, offset)?;
    check_signed_width(width)?;

    if width < MAX_SIGNED_BITS {
        let half = 1i128 << (width - 1);
        if value < -half || value >= half {
            return Err(PackError::FieldOverflow { width });
        }
    }

    let raw = (value as u128) & mask_u128(width);
    write_field(acc, U256::from(raw), width, offset)
}

/// Read a two's-complement signed field, sign-extending it to `i128`.
pub fn read_signed_field(word: U256, width: u32, offset: u32) -> Result<i128, PackError> {
    check_signed_width(width)?;
    let raw = read_field(word, width, offset)?.low();
    let shift = MAX_SIGNED_BITS - width;
    Ok(((raw << shift) as i128) >> shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let mut word = U256::ZERO;
        word = write_field(word, U256::from(10u32), 4, 0).unwrap();
        word = write_field(word, U256::from(1021u32), 10, 4).unwrap();
        word = write_field(word, U256::from(3u32), 2, 14).unwrap();

        assert_eq!(read_field(word, 4, 0).unwrap(), U256::from(10u32));
        assert_eq!(read_field(word, 10, 4).unwrap(), U256::from(1021u32));
        assert_eq!(read_field(word, 2, 14).unwrap(), U256::from(3u32));
    }

    #[test]
    fn test_write_replaces_field_only() {
        let word = U256::MAX;
        let word = write_field(word, U256::ZERO, 8, 8).unwrap();
        assert_eq!(read_field(word, 8, 8).unwrap(), U256::ZERO);
        assert_eq!(read_field(word, 8, 0).unwrap(), U256::from(0xFFu32));
        assert_eq!(read_field(word, 8, 16).unwrap(), U256::from(0xFFu32));
    }

    #[test]
    fn test_full_word_field() {
        let word = write_field(U256::ZERO, U256::MAX, 256, 0).unwrap();
        assert_eq!(word, U256::MAX);
        assert_eq!(read_field(word, 256, 0).unwrap(), U256::MAX);
    }

    #[test]
    fn test_top_bits() {
        let word = write_field(U256::ZERO, U256::from(u32::MAX), 32, 224).unwrap();
        assert_eq!(word, U256::from_parts((u32::MAX as u128) << 96, 0));
        assert_eq!(read_field(word, 32, 224).unwrap(), U256::from(u32::MAX));
    }

    #[test]
    fn test_field_straddling_halves() {
        let value = U256::low_mask(160);
        let word = write_field(U256::ZERO, value, 160, 64).unwrap();
        assert_eq!(read_field(word, 160, 64).unwrap(), value);
        assert_eq!(read_field(word, 64, 0).unwrap(), U256::ZERO);
        assert_eq!(read_field(word, 32, 224).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_overflow_rejected() {
        let max = U256::low_mask(12);
        assert!(write_field(U256::ZERO, max, 12, 0).is_ok());

        let result = write_field(U256::ZERO, U256::ONE << 12, 12, 0);
        assert_eq!(result, Err(PackError::FieldOverflow { width: 12 }));
    }

    #[test]
    fn test_placement_rejected() {
        assert!(matches!(
            write_field(U256::ZERO, U256::ZERO, 8, 250),
            Err(PackError::LayoutError(_))
        ));
        assert!(matches!(
            write_field(U256::ZERO, U256::ZERO, 0, 0),
            Err(PackError::LayoutError(_))
        ));
        assert!(matches!(
            read_field(U256::ZERO, 257, 0),
            Err(PackError::LayoutError(_))
        ));
        assert!(matches!(
            read_field(U256::ZERO, 1, 256),
            Err(PackError::LayoutError(_))
        ));
    }

    #[test]
    fn test_signed_roundtrip() {
        for value in [0i128, 1, -1, 42, -42, (1 << 95) - 1, -(1 << 95)] {
            let word = write_signed_field(U256::ZERO, value, 96, 128).unwrap();
            assert_eq!(read_signed_field(word, 96, 128).unwrap(), value);
        }
    }

    #[test]
    fn test_signed_is_twos_complement() {
        let word = write_signed_field(U256::ZERO, -1, 8, 0).unwrap();
        assert_eq!(word, U256::from(0xFFu32));
        let word = write_signed_field(U256::ZERO, -128, 8, 8).unwrap();
        assert_eq!(read_field(word, 8, 8).unwrap(), U256::from(0x80u32));
    }

    #[test]
    fn test_signed_bounds() {
        assert_eq!(
            write_signed_field(U256::ZERO, 1 << 95, 96, 0),
            Err(PackError::FieldOverflow { width: 96 })
        );
        assert_eq!(
            write_signed_field(U256::ZERO, -(1 << 95) - 1, 96, 0),
            Err(PackError::FieldOverflow { width: 96 })
        );
        assert_eq!(
            write_signed_field(U256::ZERO, 1, 1, 0),
            Err(PackError::FieldOverflow { width: 1 })
        );
        assert!(write_signed_field(U256::ZERO, -1, 1, 0).is_ok());
    }

    #[test]
    fn test_signed_full_width() {
        for value in [i128::MIN, i128::MAX, -7] {
            let word = write_signed_field(U256::ZERO, value, 128, 64).unwrap();
            assert_eq!(read_signed_field(word, 128, 64).unwrap(), value);
        }
    }

    #[test]
    fn test_signed_too_wide() {
        assert!(matches!(
            write_signed_field(U256::ZERO, 0, 129, 0),
            Err(PackError::LayoutError(_))
        ));
        assert!(matches!(
            read_signed_field(U256::ZERO, 129, 0),
            Err(PackError::LayoutError(_))
        ));
    }
}
