//! BLS12-381 scalar field element (Fr).
//!
//! Wraps `bls12_381::Scalar` with validation on construction to ensure
//! canonical representation.

use crate::error::{ErrorCode, PoseidonResult};
use bls12_381::Scalar;
use ff::Field;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A BLS12-381 scalar field element.
///
/// This is a newtype wrapper around `bls12_381::Scalar` that enforces
/// canonical encoding on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fr(Scalar);

impl Fr {
    /// The additive identity (zero).
    pub const ZERO: Fr = Fr(Scalar::ZERO);

    /// The multiplicative identity (one).
    pub const ONE: Fr = Fr(Scalar::ONE);

    /// 2^64, used to shift length tags above any small domain tag.
    pub(crate) const TWO_POW_64: Fr = Fr(Scalar::from_raw([0, 1, 0, 0]));

    /// Create an Fr from a u64 value.
    pub fn from_u64(val: u64) -> Fr {
        Fr(Scalar::from(val))
    }

    /// Create an Fr from raw bytes (little-endian).
    ///
    /// Returns an error if the bytes do not represent a canonical field element
    /// (i.e., the value is >= the field modulus).
    pub fn from_bytes_le(bytes: &[u8; 32]) -> PoseidonResult<Fr> {
        Option::<Scalar>::from(Scalar::from_bytes(bytes))
            .map(Fr)
            .ok_or_else(|| ErrorCode::NonCanonicalFr(hex::encode(bytes)))
    }

    /// Create an Fr from 32 little-endian bytes, reducing modulo the field
    /// modulus instead of rejecting.
    pub fn from_bytes_le_reduced(bytes: &[u8; 32]) -> Fr {
        let mut wide = [0u8; 64];
        wide[..32].copy_from_slice(bytes);
        Fr(Scalar::from_bytes_wide(&wide))
    }

    /// Create an Fr from a hex string (64 lowercase hex chars, LE encoding).
    pub fn from_hex(hex_str: &str) -> PoseidonResult<Fr> {
        Self::from_bytes_le(&decode_32(hex_str)?)
    }

    /// Create an Fr from a big-endian hex string, with or without `0x`.
    ///
    /// Published test vectors use this notation.
    pub fn from_hex_be(hex_str: &str) -> PoseidonResult<Fr> {
        let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let padded = format!("{:0>64}", digits);
        let mut bytes = decode_32(&padded)?;
        bytes.reverse();
        Self::from_bytes_le(&bytes)
    }

    /// Convert to canonical 32-byte little-endian representation.
    pub fn to_bytes_le(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Convert to 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes_le())
    }

    /// Compute x^5 (the usual Poseidon S-box).
    pub fn pow5(&self) -> Fr {
        let x2 = self.0 * self.0;
        let x4 = x2 * x2;
        Fr(x4 * self.0)
    }

    /// Compute x^alpha for a small exponent.
    #[inline]
    pub fn pow(&self, alpha: u64) -> Fr {
        match alpha {
            5 => self.pow5(),
            _ => Fr(self.0.pow_vartime(&[alpha, 0, 0, 0])),
        }
    }

    /// Square the field element.
    pub fn square(&self) -> Fr {
        Fr(self.0 * self.0)
    }

    /// Multiplicative inverse, or `None` for zero.
    pub fn invert(&self) -> Option<Fr> {
        Option::<Scalar>::from(self.0.invert()).map(Fr)
    }

    /// Whether this is the additive identity.
    pub fn is_zero(&self) -> bool {
        bool::from(self.0.is_zero())
    }

    /// Convert to decimal string representation.
    pub fn to_decimal(&self) -> String {
        let bytes = self.to_bytes_le();

        let mut value = [0u64; 4];
        for (limb, chunk) in value.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(buf);
        }

        if value == [0, 0, 0, 0] {
            return "0".to_string();
        }

        let mut result = String::new();
        while value != [0, 0, 0, 0] {
            let remainder = div_by_10(&mut value);
            result.push((b'0' + remainder) as char);
        }

        result.chars().rev().collect()
    }
}

fn decode_32(hex_str: &str) -> PoseidonResult<[u8; 32]> {
    if hex_str.len() != 64 {
        return Err(ErrorCode::WrongLength(
            "64".to_string(),
            hex_str.len() as u64,
        ));
    }

    let bytes = hex::decode(hex_str).map_err(|_| ErrorCode::InvalidHex)?;

    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Divide a 256-bit number (as 4 u64 limbs, little-endian) by 10 in place.
/// Returns the remainder.
fn div_by_10(limbs: &mut [u64; 4]) -> u8 {
    let mut carry: u128 = 0;
    for limb in limbs.iter_mut().rev() {
        let cur = (carry << 64) | *limb as u128;
        *limb = (cur / 10) as u64;
        carry = cur % 10;
    }
    carry as u8
}

impl Default for Fr {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for Fr {
    fn from(val: u64) -> Self {
        Fr::from_u64(val)
    }
}

impl Add for Fr {
    type Output = Fr;
    fn add(self, rhs: Fr) -> Fr {
        Fr(self.0 + rhs.0)
    }
}

impl AddAssign for Fr {
    fn add_assign(&mut self, rhs: Fr) {
        self.0 += rhs.0;
    }
}

impl Sub for Fr {
    type Output = Fr;
    fn sub(self, rhs: Fr) -> Fr {
        Fr(self.0 - rhs.0)
    }
}

impl Mul for Fr {
    type Output = Fr;
    fn mul(self, rhs: Fr) -> Fr {
        Fr(self.0 * rhs.0)
    }
}

impl Neg for Fr {
    type Output = Fr;
    fn neg(self) -> Fr {
        Fr(-self.0)
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Fr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fr::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
