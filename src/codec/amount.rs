//! Integer quantities
//!
//! Fees, balances and token amounts are unsigned 128-bit integers carried as
//! decimal strings on the wire. Nothing here ever goes through floating point.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use super::CodecError;

/// A non-negative quantity that fits the 16-byte wire encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    /// 2^128 - 1, the largest value a 16-byte field can carry
    pub const MAX: Amount = Amount(u128::MAX);

    pub const fn new(value: u128) -> Self {
        Amount(value)
    }

    pub const fn value(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Big-endian 16-byte form used in request preimages
    pub fn to_be_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl FromStr for Amount {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::InvalidDecimal(s.to_string()));
        }
        s.parse::<u128>()
            .map(Amount)
            .map_err(|_| CodecError::Overflow {
                value: s.to_string(),
                width: 16,
            })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value as u128)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc.saturating_add(a))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(Amount(v))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Convert a decimal string to big-endian hex, left padded to `byte_width` bytes
pub fn decimal_to_fixed_hex(decimal: &str, byte_width: usize) -> Result<String, CodecError> {
    if byte_width == 0 || byte_width > 16 {
        return Err(CodecError::UnsupportedWidth(byte_width));
    }
    let amount: Amount = decimal.parse()?;
    if byte_width < 16 && amount.0 >> (byte_width * 8) != 0 {
        return Err(CodecError::Overflow {
            value: decimal.to_string(),
            width: byte_width,
        });
    }
    let bytes = amount.to_be_bytes();
    Ok(hex::encode_upper(&bytes[16 - byte_width..]))
}
