//! BLS12-381 scalar field (Fr) operations.
//!
//! This module provides the Fr type used throughout the engine for
//! field arithmetic, parameter generation and hashing.

mod fr;

pub use fr::Fr;

/// BLS12-381 scalar field modulus as decimal string.
pub const MODULUS_DECIMAL: &str =
    "52435875175126190479447740508185965837690552500527637822603658699938581184513";

/// BLS12-381 scalar field modulus as 64-char hex (little-endian bytes).
pub const MODULUS_HEX: &str = "01000000fffffffffe5bfeff02a4bd5305d8a10908d83933487d9d2953a7ed73";

/// Bit length of the modulus, `ceil(log2(r))`.
pub const MODULUS_BITS: u32 = 255;

/// Modulus bytes, little-endian.
const MODULUS_LE: [u8; 32] = [
    0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0x02, 0xa4, 0xbd, 0x53,
    0x05, 0xd8, 0xa1, 0x09, 0x08, 0xd8, 0x39, 0x33, 0x48, 0x7d, 0x9d, 0x29, 0x53, 0xa7, 0xed, 0x73,
];

/// `(r - 1) mod d`, used to check that `x -> x^alpha` is a permutation.
pub(crate) fn modulus_minus_one_rem(d: u64) -> u64 {
    let mut p_minus_one = MODULUS_LE;
    // r is odd, so subtracting one never borrows
    p_minus_one[0] -= 1;

    let d = d as u128;
    p_minus_one
        .iter()
        .rev()
        .fold(0u128, |rem, &byte| ((rem << 8) | byte as u128) % d) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulus_constants_agree() {
        assert_eq!(hex::encode(MODULUS_LE), MODULUS_HEX);
    }

    #[test]
    fn test_two_adicity_visible_in_remainder() {
        // r - 1 is divisible by 2^32 and by 3, but not by 5
        assert_eq!(modulus_minus_one_rem(1 << 32), 0);
        assert_eq!(modulus_minus_one_rem(3), 0);
        assert_ne!(modulus_minus_one_rem(5), 0);
    }
}
