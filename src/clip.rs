//! Bounded lossy compression of monetary amounts.
//!
//! A clipped amount is stored as a mantissa and an exponent:
//!
//! ```text
//! amount ≈ mantissa << (exponent * granularity)
//! ```
//!
//! The exponent is the smallest one that lets the mantissa fit, and the
//! mantissa is truncated, so the stored value never exceeds the original.
//! Whenever the exponent is non-zero the mantissa has at least
//! `mantissa_bits - granularity` significant bits, which bounds the loss:
//!
//! ```text
//! original - stored < original / 2^(mantissa_bits - granularity)
//! ```
//!
//! Amounts that fit the mantissa directly (zero included) are stored exactly.

use crate::error::PackError;
use crate::word::{U256, WORD_BITS};

/// Bits the amount is shifted by per exponent step, for [`DEPOSIT_CLIP`].
pub const DEPOSIT_SHIFT_GRANULARITY: u32 = 8;

/// The clip format used for deposits in the record layouts.
///
/// 60-bit mantissa and 4-bit exponent in 8-bit steps: a 64-bit field holding
/// amounts up to `(2^60 - 1) * 2^120` with 52 bits of relative precision.
pub const DEPOSIT_CLIP: ClipFormat = ClipFormat::new(60, 4, DEPOSIT_SHIFT_GRANULARITY);

/// A mantissa/exponent pair produced by [`ClipFormat::clip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clipped {
    /// Truncated, shifted amount.
    pub mantissa: U256,
    /// Number of granularity steps the amount was shifted by.
    pub exponent: u32,
}

/// Shape of a clipped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipFormat {
    mantissa_bits: u32,
    exponent_bits: u32,
    granularity: u32,
}

impl ClipFormat {
    /// Create a clip format.
    ///
    /// # Panics
    ///
    /// Panics if any width is zero, if `granularity >= mantissa_bits`, if the
    /// exponent is wider than 16 bits, or if the largest shifted mantissa
    /// does not fit in a 256-bit word. In a `const` context these are
    /// compile-time errors.
    pub const fn new(mantissa_bits: u32, exponent_bits: u32, granularity: u32) -> Self {
        assert!(mantissa_bits > 0, "mantissa width must be > 0");
        assert!(exponent_bits > 0, "exponent width must be > 0");
        assert!(exponent_bits <= 16, "exponent width must be <= 16");
        assert!(granularity > 0, "granularity must be > 0");
        assert!(
            granularity < mantissa_bits,
            "granularity must be smaller than the mantissa"
        );
        let max_exponent = (1u32 << exponent_bits) - 1;
        assert!(
            mantissa_bits as u64 + max_exponent as u64 * granularity as u64 <= WORD_BITS as u64,
            "clipped amounts must fit in a word"
        );

        Self {
            mantissa_bits,
            exponent_bits,
            granularity,
        }
    }

    /// Mantissa width in bits.
    #[inline]
    pub const fn mantissa_bits(self) -> u32 {
        self.mantissa_bits
    }

    /// Exponent width in bits.
    #[inline]
    pub const fn exponent_bits(self) -> u32 {
        self.exponent_bits
    }

    /// Bits shifted per exponent step.
    #[inline]
    pub const fn granularity(self) -> u32 {
        self.granularity
    }

    /// Total width of a packed clipped value.
    #[inline]
    pub const fn width(self) -> u32 {
        self.mantissa_bits + self.exponent_bits
    }

    /// Largest exponent.
    #[inline]
    pub const fn max_exponent(self) -> u32 {
        (1u32 << self.exponent_bits) - 1
    }

    /// Relative precision `k`: the rounding loss is below `amount / 2^k`.
    #[inline]
    pub const fn precision_bits(self) -> u32 {
        self.mantissa_bits - self.granularity
    }

    /// Widest amount, in bits, this format can represent.
    #[inline]
    pub const fn max_amount_bits(self) -> u32 {
        self.mantissa_bits + self.max_exponent() * self.granularity
    }

    /// Largest amount this format can represent.
    #[inline]
    pub const fn max_amount(self) -> U256 {
        U256::low_mask(self.mantissa_bits).shl_bits(self.max_exponent() * self.granularity)
    }

    /// Compress `amount`, rounding toward zero.
    ///
    /// # Errors
    /// [`PackError::ClipOverflow`] if `amount` exceeds [`ClipFormat::max_amount`].
    pub fn clip(self, amount: U256) -> Result<Clipped, PackError> {
        let bits = amount.bits();
        let exponent = if bits <= self.mantissa_bits {
            0
        } else {
            (bits - self.mantissa_bits).div_ceil(self.granularity)
        };

        if exponent > self.max_exponent() {
            return Err(PackError::ClipOverflow {
                bits,
                max_bits: self.max_amount_bits(),
            });
        }

        Ok(Clipped {
            mantissa: amount >> (exponent * self.granularity),
            exponent,
        })
    }

    /// Expand a clipped pair back into an amount. Exact for any valid pair.
    ///
    /// # Errors
    /// [`PackError::FieldOverflow`] if the mantissa or exponent is wider than
    /// this format allows.
    pub fn unclip(self, clipped: Clipped) -> Result<U256, PackError> {
        if clipped.mantissa > U256::low_mask(self.mantissa_bits) {
            return Err(PackError::FieldOverflow {
                width: self.mantissa_bits,
            });
        }
        if clipped.exponent > self.max_exponent() {
            return Err(PackError::FieldOverflow {
                width: self.exponent_bits,
            });
        }
        Ok(clipped.mantissa << (clipped.exponent * self.granularity))
    }

    /// The value `amount` reads back as once stored.
    pub fn round(self, amount: U256) -> Result<U256, PackError> {
        self.unclip(self.clip(amount)?)
    }

    /// Clip `amount` and pack it into a single [`ClipFormat::width`]-bit
    /// value, exponent above mantissa.
    ///
    /// Packed values order the same way as the amounts they decode to.
    pub fn pack(self, amount: U256) -> Result<U256, PackError> {
        let clipped = self.clip(amount)?;
        Ok((U256::from(clipped.exponent) << self.mantissa_bits) | clipped.mantissa)
    }

    /// Inverse of [`ClipFormat::pack`]. Bits above [`ClipFormat::width`] are
    /// ignored, so every input decodes.
    pub fn unpack(self, packed: U256) -> U256 {
        let mantissa = packed & U256::low_mask(self.mantissa_bits);
        let exponent = (packed >> self.mantissa_bits) & U256::low_mask(self.exponent_bits);
        // The exponent fits in 16 bits.
        mantissa << (exponent.low() as u32 * self.granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pow2(n: u32) -> U256 {
        U256::ONE << n
    }

    #[test]
    fn test_deposit_format() {
        assert_eq!(DEPOSIT_CLIP.width(), 64);
        assert_eq!(DEPOSIT_CLIP.max_exponent(), 15);
        assert_eq!(DEPOSIT_CLIP.precision_bits(), 52);
        assert_eq!(DEPOSIT_CLIP.max_amount_bits(), 180);
        assert_eq!(DEPOSIT_CLIP.max_amount(), U256::low_mask(60) << 120);
    }

    #[test]
    fn test_zero_is_exact() {
        let clipped = DEPOSIT_CLIP.clip(U256::ZERO).unwrap();
        assert_eq!(
            clipped,
            Clipped {
                mantissa: U256::ZERO,
                exponent: 0
            }
        );
        assert_eq!(DEPOSIT_CLIP.unclip(clipped).unwrap(), U256::ZERO);
        assert_eq!(DEPOSIT_CLIP.pack(U256::ZERO).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_small_amount_is_exact() {
        let amount = U256::low_mask(60);
        let clipped = DEPOSIT_CLIP.clip(amount).unwrap();
        assert_eq!(clipped.exponent, 0);
        assert_eq!(DEPOSIT_CLIP.unclip(clipped).unwrap(), amount);
    }

    #[test]
    fn test_smallest_exponent_chosen() {
        // 61 bits needs one step.
        let clipped = DEPOSIT_CLIP.clip(pow2(60)).unwrap();
        assert_eq!(clipped.exponent, 1);
        assert_eq!(clipped.mantissa, pow2(52));

        // 68 bits still needs only one step.
        let clipped = DEPOSIT_CLIP.clip(U256::low_mask(68)).unwrap();
        assert_eq!(clipped.exponent, 1);
        assert_eq!(clipped.mantissa, U256::low_mask(60));

        // 69 bits needs two.
        let clipped = DEPOSIT_CLIP.clip(pow2(68)).unwrap();
        assert_eq!(clipped.exponent, 2);
    }

    #[test]
    fn test_rounds_toward_zero() {
        // 2^70 + 0xFFFF loses its low 16 bits.
        let amount = pow2(70) | U256::from(0xFFFFu32);
        assert_eq!(DEPOSIT_CLIP.round(amount).unwrap(), pow2(70));
    }

    #[test]
    fn test_example_deposit() {
        let amount = U256::from(14_400_000_000_000_000_000_000u128);
        let clipped = DEPOSIT_CLIP.clip(amount).unwrap();
        assert_eq!(clipped.exponent, 2);
        assert_eq!(
            clipped.mantissa,
            U256::from(14_400_000_000_000_000_000_000u128 >> 16)
        );
        let stored = DEPOSIT_CLIP.unclip(clipped).unwrap();
        assert!(stored <= amount);
        let loss = amount.checked_sub(stored).unwrap();
        assert!(loss < amount >> 52);
    }

    #[test]
    fn test_max_amount() {
        let max = DEPOSIT_CLIP.max_amount();
        let clipped = DEPOSIT_CLIP.clip(max).unwrap();
        assert_eq!(clipped.exponent, 15);
        assert_eq!(DEPOSIT_CLIP.unclip(clipped).unwrap(), max);
    }

    #[test]
    fn test_clip_overflow() {
        assert_eq!(
            DEPOSIT_CLIP.clip(pow2(180)),
            Err(PackError::ClipOverflow {
                bits: 181,
                max_bits: 180
            })
        );
        assert!(matches!(
            DEPOSIT_CLIP.clip(U256::MAX),
            Err(PackError::ClipOverflow { bits: 256, .. })
        ));
    }

    #[test]
    fn test_unclip_rejects_invalid_pair() {
        let wide_mantissa = Clipped {
            mantissa: pow2(60),
            exponent: 0,
        };
        assert_eq!(
            DEPOSIT_CLIP.unclip(wide_mantissa),
            Err(PackError::FieldOverflow { width: 60 })
        );
        let wide_exponent = Clipped {
            mantissa: U256::ONE,
            exponent: 16,
        };
        assert_eq!(
            DEPOSIT_CLIP.unclip(wide_exponent),
            Err(PackError::FieldOverflow { width: 4 })
        );
    }

    #[test]
    fn test_pack_layout() {
        let packed = DEPOSIT_CLIP.pack(pow2(60)).unwrap();
        assert_eq!(packed, (U256::ONE << 60) | pow2(52));
        assert_eq!(DEPOSIT_CLIP.unpack(packed), pow2(60));
        assert!(packed.bits() <= DEPOSIT_CLIP.width());
    }

    #[test]
    fn test_unpack_ignores_high_bits() {
        let packed = DEPOSIT_CLIP.pack(U256::from(12345u32)).unwrap();
        assert_eq!(DEPOSIT_CLIP.unpack(packed | (U256::ONE << 200)), U256::from(12345u32));
    }

    #[test]
    fn test_other_granularity() {
        let format = ClipFormat::new(16, 4, 4);
        assert_eq!(format.precision_bits(), 12);
        let clipped = format.clip(U256::from(0x12345u32)).unwrap();
        assert_eq!(clipped.exponent, 1);
        assert_eq!(clipped.mantissa, U256::from(0x1234u32));
    }

    #[test]
    #[should_panic(expected = "granularity must be smaller than the mantissa")]
    fn test_invalid_granularity_panics() {
        let _ = ClipFormat::new(8, 4, 8);
    }

    #[test]
    #[should_panic(expected = "clipped amounts must fit in a word")]
    fn test_oversized_format_panics() {
        let _ = ClipFormat::new(64, 8, 8);
    }

    fn amount_strategy() -> impl Strategy<Value = U256> {
        (any::<u128>(), any::<u128>(), 0u32..=180).prop_map(|(hi, lo, bits)| {
            U256::from_parts(hi, lo) & U256::low_mask(bits)
        })
    }

    proptest! {
        #[test]
        fn prop_clip_never_rounds_up(amount in amount_strategy()) {
            let stored = DEPOSIT_CLIP.round(amount).unwrap();
            prop_assert!(stored <= amount);
        }

        #[test]
        fn prop_clip_loss_is_bounded(amount in amount_strategy()) {
            let clipped = DEPOSIT_CLIP.clip(amount).unwrap();
            let stored = DEPOSIT_CLIP.unclip(clipped).unwrap();
            let loss = amount.checked_sub(stored).unwrap();
            if clipped.exponent == 0 {
                prop_assert_eq!(loss, U256::ZERO);
            } else {
                prop_assert!(loss < amount >> DEPOSIT_CLIP.precision_bits());
            }
        }

        #[test]
        fn prop_pack_is_monotonic(a in amount_strategy(), b in amount_strategy()) {
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(DEPOSIT_CLIP.pack(small).unwrap() <= DEPOSIT_CLIP.pack(large).unwrap());
        }

        #[test]
        fn prop_rounding_is_idempotent(amount in amount_strategy()) {
            let once = DEPOSIT_CLIP.round(amount).unwrap();
            prop_assert_eq!(DEPOSIT_CLIP.round(once).unwrap(), once);
        }
    }
}
