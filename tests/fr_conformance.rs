//! Fr field tests.
//!
//! Encoding, canonical validation and the arithmetic the permutation relies
//! on (S-box exponentiation and inversion for the MDS construction).

use poseidon_engine::field::{MODULUS_DECIMAL, MODULUS_HEX};
use poseidon_engine::{ErrorCode, Fr};

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn small_values_encode_little_endian() {
    let cases = [
        (2u64, "0200000000000000000000000000000000000000000000000000000000000000"),
        (255, "ff00000000000000000000000000000000000000000000000000000000000000"),
        (256, "0001000000000000000000000000000000000000000000000000000000000000"),
        (65535, "ffff000000000000000000000000000000000000000000000000000000000000"),
    ];
    for (val, expected) in cases {
        assert_eq!(Fr::from_u64(val).to_hex(), expected, "value {}", val);
    }
}

#[test]
fn modulus_minus_one_roundtrips() {
    let max_valid = "00000000fffffffffe5bfeff02a4bd5305d8a10908d83933487d9d2953a7ed73";
    let fr = Fr::from_hex(max_valid).unwrap();
    assert_eq!(fr.to_hex(), max_valid);
    assert_eq!(fr + Fr::ONE, Fr::ZERO);
}

#[test]
fn big_endian_hex_matches_little_endian() {
    let le = Fr::from_hex("2a00000000000000000000000000000000000000000000000000000000000000").unwrap();
    assert_eq!(Fr::from_hex_be("0x2a").unwrap(), le);
    assert_eq!(Fr::from_hex_be("2a").unwrap(), le);
}

#[test]
fn decimal_display() {
    assert_eq!(Fr::ZERO.to_string(), "0");
    assert_eq!(Fr::from_u64(1234567890).to_string(), "1234567890");
    let max = Fr::ZERO - Fr::ONE;
    let expected = {
        // MODULUS_DECIMAL ends in ...513
        let mut s = MODULUS_DECIMAL.to_string();
        s.pop();
        s.push('2');
        s
    };
    assert_eq!(max.to_decimal(), expected);
}

#[test]
fn serde_uses_hex_strings() {
    let fr = Fr::from_u64(7);
    let json = serde_json::to_string(&fr).unwrap();
    assert_eq!(
        json,
        "\"0700000000000000000000000000000000000000000000000000000000000000\""
    );
    let back: Fr = serde_json::from_str(&json).unwrap();
    assert_eq!(back, fr);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn wrong_length_rejected() {
    match Fr::from_hex("0011223344").unwrap_err() {
        ErrorCode::WrongLength(expected, got) => {
            assert_eq!(expected, "64");
            assert_eq!(got, 10);
        }
        e => panic!("expected WrongLength, got {:?}", e),
    }
}

#[test]
fn invalid_hex_rejected() {
    let invalid = "gg00000000000000000000000000000000000000000000000000000000000000";
    assert_eq!(Fr::from_hex(invalid).unwrap_err(), ErrorCode::InvalidHex);
}

#[test]
fn modulus_rejected_as_non_canonical() {
    assert!(matches!(
        Fr::from_hex(MODULUS_HEX),
        Err(ErrorCode::NonCanonicalFr(_))
    ));
    assert!(matches!(
        Fr::from_hex("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"),
        Err(ErrorCode::NonCanonicalFr(_))
    ));
}

#[test]
fn reduced_decoding_wraps_modulus_to_zero() {
    let bytes: [u8; 32] = hex::decode(MODULUS_HEX).unwrap().try_into().unwrap();
    assert_eq!(Fr::from_bytes_le_reduced(&bytes), Fr::ZERO);
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn ring_identities() {
    let a = Fr::from_u64(12345);
    let b = Fr::from_u64(67890);
    let c = Fr::from_u64(4);
    assert_eq!(a + b, b + a);
    assert_eq!(a * b, b * a);
    assert_eq!(a * (b + c), a * b + a * c);
    assert_eq!(a - a, Fr::ZERO);
    assert_eq!(a + -a, Fr::ZERO);
}

#[test]
fn sbox_powers() {
    assert_eq!(Fr::from_u64(2).pow5(), Fr::from_u64(32));
    assert_eq!(Fr::from_u64(3).pow(5), Fr::from_u64(243));
    assert_eq!(Fr::from_u64(2).pow(17), Fr::from_u64(131072));
    assert_eq!(Fr::ZERO.pow5(), Fr::ZERO);
}

#[test]
fn inversion() {
    let a = Fr::from_u64(987654321);
    let inv = a.invert().unwrap();
    assert_eq!(a * inv, Fr::ONE);
    assert_eq!(Fr::ZERO.invert(), None);
    assert!(Fr::ZERO.is_zero());
    assert!(!Fr::ONE.is_zero());
}
