//! Opaque 160-bit account addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::PackError;
use crate::word::{U256, WORD_BYTES};

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 20;

/// Number of bits in an address.
pub const ADDRESS_BITS: u32 = 160;

/// A 20-byte account address, stored raw in the low 160 bits of a word.
///
/// Parsed from and displayed as `0x`-prefixed hex. Case is not checked on
/// input and output is lowercase.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Address([0u8; ADDRESS_BYTES]);

    /// Raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// The address as an unsigned integer.
    pub fn to_u256(self) -> U256 {
        let mut word = [0u8; WORD_BYTES];
        word[WORD_BYTES - ADDRESS_BYTES..].copy_from_slice(&self.0);
        U256::from_be_bytes(word)
    }

    /// Narrow an integer to an address.
    ///
    /// # Errors
    /// [`PackError::FieldOverflow`] if `value` needs more than 160 bits.
    pub fn from_u256(value: U256) -> Result<Self, PackError> {
        if value.bits() > ADDRESS_BITS {
            return Err(PackError::FieldOverflow {
                width: ADDRESS_BITS,
            });
        }
        let word = value.to_be_bytes();
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes.copy_from_slice(&word[WORD_BYTES - ADDRESS_BYTES..]);
        Ok(Address(bytes))
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PackError::InvalidAddress(s.to_string());
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if digits.len() != ADDRESS_BYTES * 2 {
            return Err(invalid());
        }

        let mut bytes = [0u8; ADDRESS_BYTES];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| invalid())?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLISHER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_parse_display() {
        let address: Address = PUBLISHER.parse().unwrap();
        assert_eq!(address.0[0], 0xf3);
        assert_eq!(address.0[19], 0x66);
        assert_eq!(address.to_string(), PUBLISHER.to_lowercase());
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(
            "f39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>(),
            Err(PackError::InvalidAddress(_))
        ));
        // 39 digits
        assert!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb9226"
            .parse::<Address>()
            .is_err());
        assert!("0xg39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse::<Address>()
            .is_err());
    }

    #[test]
    fn test_u256_conversion() {
        let address: Address = PUBLISHER.parse().unwrap();
        let value = address.to_u256();
        assert!(value.bits() <= ADDRESS_BITS);
        assert_eq!(Address::from_u256(value).unwrap(), address);
        assert_eq!(Address::ZERO.to_u256(), U256::ZERO);
    }

    #[test]
    fn test_from_u256_rejects_wide() {
        assert_eq!(
            Address::from_u256(U256::ONE << 160),
            Err(PackError::FieldOverflow { width: 160 })
        );
    }
}
