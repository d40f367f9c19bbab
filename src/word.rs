//! 256-bit storage words.
//!
//! A [`U256`] is the unit every packed record is written into. Only the
//! operations the codec needs are provided: shifts, masks, bitwise logic,
//! ordering, checked add/sub, and conversions to and from the 32-byte
//! big-endian form a storage slot holds.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Shl, Shr};
use std::str::FromStr;

use crate::error::PackError;

/// Number of bits in a storage word.
pub const WORD_BITS: u32 = 256;

/// Number of bytes in a storage word.
pub const WORD_BYTES: usize = 32;

/// Largest power of ten that fits in a u64.
const DECIMAL_CHUNK: u64 = 10_000_000_000_000_000_000;

/// An unsigned 256-bit integer.
///
/// Stored as two `u128` halves. Field order matters: the derived ordering
/// compares `hi` before `lo`, which is numeric ordering.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct U256 {
    hi: u128,
    lo: u128,
}

impl U256 {
    /// The value 0.
    pub const ZERO: Self = Self { hi: 0, lo: 0 };

    /// The value 1.
    pub const ONE: Self = Self { hi: 0, lo: 1 };

    /// The value `2^256 - 1`.
    pub const MAX: Self = Self {
        hi: u128::MAX,
        lo: u128::MAX,
    };

    /// Build a word from its high and low 128-bit halves.
    #[inline]
    pub const fn from_parts(hi: u128, lo: u128) -> Self {
        Self { hi, lo }
    }

    /// Widen a `u128`.
    #[inline]
    pub const fn from_u128(value: u128) -> Self {
        Self { hi: 0, lo: value }
    }

    /// The high 128 bits.
    #[inline]
    pub const fn high(self) -> u128 {
        self.hi
    }

    /// The low 128 bits.
    #[inline]
    pub const fn low(self) -> u128 {
        self.lo
    }

    /// Returns `true` if the value is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    /// Number of significant bits (0 for zero).
    #[inline]
    pub const fn bits(self) -> u32 {
        if self.hi != 0 {
            WORD_BITS - self.hi.leading_zeros()
        } else {
            128 - self.lo.leading_zeros()
        }
    }

    /// A mask with the low `width` bits set. Widths of 256 and above give
    /// [`U256::MAX`].
    #[inline]
    pub const fn low_mask(width: u32) -> Self {
        if width >= WORD_BITS {
            Self::MAX
        } else if width > 128 {
            Self {
                hi: (1u128 << (width - 128)) - 1,
                lo: u128::MAX,
            }
        } else if width == 128 {
            Self {
                hi: 0,
                lo: u128::MAX,
            }
        } else {
            Self {
                hi: 0,
                lo: (1u128 << width) - 1,
            }
        }
    }

    /// Logical shift left. Bits shifted past bit 255 are discarded.
    #[inline]
    pub const fn shl_bits(self, n: u32) -> Self {
        if n == 0 {
            self
        } else if n >= WORD_BITS {
            Self::ZERO
        } else if n >= 128 {
            Self {
                hi: self.lo << (n - 128),
                lo: 0,
            }
        } else {
            Self {
                hi: (self.hi << n) | (self.lo >> (128 - n)),
                lo: self.lo << n,
            }
        }
    }

    /// Logical shift right.
    #[inline]
    pub const fn shr_bits(self, n: u32) -> Self {
        if n == 0 {
            self
        } else if n >= WORD_BITS {
            Self::ZERO
        } else if n >= 128 {
            Self {
                hi: 0,
                lo: self.hi >> (n - 128),
            }
        } else {
            Self {
                hi: self.hi >> n,
                lo: (self.lo >> n) | (self.hi << (128 - n)),
            }
        }
    }

    /// Bitwise AND.
    #[inline]
    pub const fn and(self, rhs: Self) -> Self {
        Self {
            hi: self.hi & rhs.hi,
            lo: self.lo & rhs.lo,
        }
    }

    /// Bitwise OR.
    #[inline]
    pub const fn or(self, rhs: Self) -> Self {
        Self {
            hi: self.hi | rhs.hi,
            lo: self.lo | rhs.lo,
        }
    }

    /// Bitwise NOT.
    #[inline]
    pub const fn complement(self) -> Self {
        Self {
            hi: !self.hi,
            lo: !self.lo,
        }
    }

    /// Narrow to `u128` if the value fits.
    #[inline]
    pub const fn to_u128(self) -> Option<u128> {
        if self.hi == 0 {
            Some(self.lo)
        } else {
            None
        }
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let (lo, carry) = self.lo.overflowing_add(rhs.lo);
        let hi = self.hi.checked_add(rhs.hi)?.checked_add(carry as u128)?;
        Some(Self { hi, lo })
    }

    /// Checked subtraction.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        let (lo, borrow) = self.lo.overflowing_sub(rhs.lo);
        let hi = self.hi.checked_sub(rhs.hi)?.checked_sub(borrow as u128)?;
        Some(Self { hi, lo })
    }

    /// Big-endian byte representation, as stored in a 32-byte slot.
    pub fn to_be_bytes(self) -> [u8; WORD_BYTES] {
        let mut out = [0u8; WORD_BYTES];
        out[..16].copy_from_slice(&self.hi.to_be_bytes());
        out[16..].copy_from_slice(&self.lo.to_be_bytes());
        out
    }

    /// Inverse of [`U256::to_be_bytes`].
    pub fn from_be_bytes(bytes: [u8; WORD_BYTES]) -> Self {
        let mut hi = [0u8; 16];
        let mut lo = [0u8; 16];
        hi.copy_from_slice(&bytes[..16]);
        lo.copy_from_slice(&bytes[16..]);
        Self {
            hi: u128::from_be_bytes(hi),
            lo: u128::from_be_bytes(lo),
        }
    }

    // Little-endian 64-bit limbs.
    fn to_limbs(self) -> [u64; 4] {
        [
            self.lo as u64,
            (self.lo >> 64) as u64,
            self.hi as u64,
            (self.hi >> 64) as u64,
        ]
    }

    fn from_limbs(limbs: [u64; 4]) -> Self {
        Self {
            hi: ((limbs[3] as u128) << 64) | limbs[2] as u128,
            lo: ((limbs[1] as u128) << 64) | limbs[0] as u128,
        }
    }

    fn checked_mul_u64(self, factor: u64) -> Option<Self> {
        let limbs = self.to_limbs();
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for (slot, &limb) in out.iter_mut().zip(limbs.iter()) {
            let product = limb as u128 * factor as u128 + carry;
            *slot = product as u64;
            carry = product >> 64;
        }
        if carry != 0 {
            return None;
        }
        Some(Self::from_limbs(out))
    }

    fn div_rem_u64(self, divisor: u64) -> (Self, u64) {
        let limbs = self.to_limbs();
        let mut quotient = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = (rem << 64) | limbs[i] as u128;
            quotient[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        (Self::from_limbs(quotient), rem as u64)
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self::from_u128(value as u128)
    }
}

impl From<u32> for U256 {
    fn from(value: u32) -> Self {
        Self::from_u128(value as u128)
    }
}

impl Shl<u32> for U256 {
    type Output = Self;

    #[inline]
    fn shl(self, n: u32) -> Self {
        self.shl_bits(n)
    }
}

impl Shr<u32> for U256 {
    type Output = Self;

    #[inline]
    fn shr(self, n: u32) -> Self {
        self.shr_bits(n)
    }
}

impl BitAnd for U256 {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for U256 {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl Not for U256 {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        self.complement()
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(small) = self.to_u128() {
            return fmt::Display::fmt(&small, f);
        }

        let mut chunks = Vec::new();
        let mut rest = *self;
        while !rest.is_zero() {
            let (quotient, rem) = rest.div_rem_u64(DECIMAL_CHUNK);
            chunks.push(rem);
            rest = quotient;
        }

        let mut digits = String::with_capacity(chunks.len() * 19);
        let mut iter = chunks.iter().rev();
        if let Some(first) = iter.next() {
            digits.push_str(&first.to_string());
        }
        for chunk in iter {
            digits.push_str(&format!("{:019}", chunk));
        }
        f.pad_integral(true, "", &digits)
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = if self.hi == 0 {
            format!("{:x}", self.lo)
        } else {
            format!("{:x}{:032x}", self.hi, self.lo)
        };
        f.pad_integral(true, "0x", &digits)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({:#x})", self)
    }
}

/// Parses a decimal literal, or a hexadecimal one with a `0x` prefix.
impl FromStr for U256 {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PackError::InvalidLiteral(s.to_string());

        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if digits.is_empty() || digits.len() > WORD_BYTES * 2 {
                return Err(invalid());
            }
            let padded = format!("{:0>64}", digits);
            let bytes = hex::decode(padded).map_err(|_| invalid())?;
            let mut word = [0u8; WORD_BYTES];
            word.copy_from_slice(&bytes);
            return Ok(Self::from_be_bytes(word));
        }

        if s.is_empty() {
            return Err(invalid());
        }
        let mut value = Self::ZERO;
        for c in s.chars() {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            value = value
                .checked_mul_u64(10)
                .and_then(|v| v.checked_add(Self::from(digit)))
                .ok_or_else(invalid)?;
        }
        Ok(value)
    }
}
