//! Arithmetic over the BN254 scalar field.
//!
//! Every amount, entropy, commitment and public signal is an element of this
//! field. Values are kept canonical (strictly below the modulus), so equality
//! on [`Fr`] is equality in the field.

use alloy_primitives::U256;
use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// BN254 scalar field modulus:
/// 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const MODULUS: U256 = U256::from_limbs([
    0x43e1_f593_f000_0001,
    0x2833_e848_79b9_7091,
    0xb850_45b6_8181_585d,
    0x3064_4e72_e131_a029,
]);

/// A canonical field element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fr(U256);

impl Fr {
    pub const ZERO: Fr = Fr(U256::ZERO);

    /// Accepts `value` only if it is already below the modulus.
    pub fn from_canonical(value: U256) -> Option<Self> {
        (value < MODULUS).then_some(Fr(value))
    }

    /// Interpret 32 big-endian bytes as an integer and reduce it mod p.
    pub fn from_be_bytes_reduced(bytes: [u8; 32]) -> Self {
        Fr(U256::from_be_bytes(bytes).reduce_mod(MODULUS))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    /// The integer representative in `[0, p)`.
    pub fn value(&self) -> U256 {
        self.0
    }

    /// Number of significant bits of the integer representative.
    pub fn bit_len(&self) -> usize {
        self.0.bit_len()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse the textual forms a circuit input file may contain:
    /// decimal, `0x`-prefixed hex, or either with a leading `-`.
    /// Inputs larger than the modulus are reduced.
    pub fn parse(text: &str) -> Result<Self, ParseFrError> {
        let trimmed = text.trim();
        if let Some(rest) = trimmed.strip_prefix('-') {
            return Self::parse_unsigned(rest).map(|v| -v);
        }
        Self::parse_unsigned(trimmed)
    }

    fn parse_unsigned(text: &str) -> Result<Self, ParseFrError> {
        if text.is_empty() {
            return Err(ParseFrError::Empty);
        }
        if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            if digits.is_empty() || digits.len() > 64 {
                return Err(ParseFrError::InvalidHex);
            }
            let mut padded = [b'0'; 64];
            padded[64 - digits.len()..].copy_from_slice(digits.as_bytes());
            let mut bytes = [0u8; 32];
            hex::decode_to_slice(padded, &mut bytes).map_err(|_| ParseFrError::InvalidHex)?;
            return Ok(Self::from_be_bytes_reduced(bytes));
        }
        let value = U256::from_str_radix(text, 10).map_err(|_| ParseFrError::InvalidDecimal)?;
        Ok(Fr(value.reduce_mod(MODULUS)))
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        Fr(U256::from(value))
    }
}

impl From<u128> for Fr {
    fn from(value: u128) -> Self {
        Fr(U256::from(value))
    }
}

impl Add for Fr {
    type Output = Fr;

    fn add(self, rhs: Fr) -> Fr {
        Fr(self.0.add_mod(rhs.0, MODULUS))
    }
}

impl AddAssign for Fr {
    fn add_assign(&mut self, rhs: Fr) {
        *self = *self + rhs;
    }
}

impl Neg for Fr {
    type Output = Fr;

    fn neg(self) -> Fr {
        if self.0.is_zero() {
            self
        } else {
            Fr(MODULUS.wrapping_sub(self.0))
        }
    }
}

impl Sub for Fr {
    type Output = Fr;

    fn sub(self, rhs: Fr) -> Fr {
        self + (-rhs)
    }
}

impl Sum for Fr {
    fn sum<I: Iterator<Item = Fr>>(iter: I) -> Fr {
        iter.fold(Fr::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Fr> for Fr {
    fn sum<I: Iterator<Item = &'a Fr>>(iter: I) -> Fr {
        iter.copied().sum()
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in self.to_be_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error returned by [`Fr::parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseFrError {
    Empty,
    InvalidHex,
    InvalidDecimal,
}

impl fmt::Display for ParseFrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFrError::Empty => f.write_str("empty field element"),
            ParseFrError::InvalidHex => f.write_str("invalid hex field element"),
            ParseFrError::InvalidDecimal => f.write_str("invalid decimal field element"),
        }
    }
}

impl core::error::Error for ParseFrError {}

impl Serialize for Fr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{Error, Visitor};

        struct FrVisitor;

        impl Visitor<'_> for FrVisitor {
            type Value = Fr;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a decimal or 0x-prefixed hex field element")
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Fr, E> {
                Fr::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: Error>(self, v: u64) -> Result<Fr, E> {
                Ok(Fr::from(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> Result<Fr, E> {
                let magnitude = Fr::from(v.unsigned_abs());
                Ok(if v < 0 { -magnitude } else { magnitude })
            }
        }

        deserializer.deserialize_any(FrVisitor)
    }
}
