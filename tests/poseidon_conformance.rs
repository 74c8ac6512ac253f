//! Poseidon conformance tests.
//!
//! Published vectors for the reference instance plus digests of the built-in
//! parameter sets, checked through every entry point: the raw permutation,
//! the sponge helpers and the batch executor.

use poseidon_engine::params::{builtin, SUPPORTED_ARITIES};
use poseidon_engine::poseidon::{hash, hash_n, permute, permute_with_trace, Padding, Sponge};
use poseidon_engine::{ErrorCode, Fr, ParameterFile, Poseidon, PoseidonConstants};
use rstest::rstest;
use std::sync::Arc;

/// Reference permutation output for BLS12-381, t = 3, R_F = 8, R_P = 57,
/// input `[0, 1, 2]`.
const REFERENCE_OUTPUT: [&str; 3] = [
    "0x28ce19420fc246a05553ad1e8c98f5c9d67166be2c18e9e4cb4b4e317dd2a78a",
    "0x51f3e312c95343a896cfd8945ea82ba956c1118ce9b9859b6ea56637b4b1ddc4",
    "0x3b2b69139b235626a0bfb56c9527ae66a7bf486ad8c11c14d1da0c69bbe0f79a",
];

fn reference_output() -> Vec<Fr> {
    REFERENCE_OUTPUT
        .iter()
        .map(|h| Fr::from_hex_be(h).unwrap())
        .collect()
}

/// Width-3 instance whose domain tag puts `2` in the capacity slot, so that
/// hashing `[0, 1]` permutes exactly `[0, 1, 2]`.
fn reference_constants() -> PoseidonConstants {
    PoseidonConstants::generate(2, 5, 4, 57, Fr::from_u64(2)).unwrap()
}

// =============================================================================
// Reference vector
// =============================================================================

#[test]
fn permutation_matches_reference_vector() {
    let constants = reference_constants();
    let mut state = [Fr::from_u64(0), Fr::from_u64(1), Fr::from_u64(2)];
    permute(&constants, &mut state).unwrap();
    assert_eq!(state.to_vec(), reference_output());
}

#[test]
fn sponge_matches_reference_vector() {
    let constants = reference_constants();
    let out = hash_n(&constants, &[Fr::ZERO, Fr::ONE], 3).unwrap();
    assert_eq!(out, reference_output());
}

#[test]
fn batch_matches_reference_vector() {
    let poseidon = Poseidon::from_constants(Arc::new(reference_constants()));
    let cfg = poseidon.default_hash_config();
    let inputs = vec![Fr::ZERO, Fr::ONE];
    let mut output = vec![Fr::ZERO; 3];

    poseidon
        .hash_many(&inputs, &mut output, 1, 2, 3, &cfg)
        .unwrap();
    assert_eq!(output, reference_output());
}

#[test]
fn trace_ends_with_permutation_output() {
    let constants = reference_constants();
    let mut state = [Fr::from_u64(0), Fr::from_u64(1), Fr::from_u64(2)];
    let trace = permute_with_trace(&constants, &mut state).unwrap();
    assert_eq!(trace.len(), constants.total_rounds());
    assert_eq!(trace.last().unwrap(), &reference_output());
    assert_eq!(state.to_vec(), reference_output());
}

#[test]
fn permute_rejects_wrong_state_length() {
    let constants = reference_constants();
    let mut state = [Fr::ZERO; 4];
    assert!(matches!(
        permute(&constants, &mut state),
        Err(ErrorCode::ShapeMismatch(_))
    ));
}

// =============================================================================
// Built-in parameter sets
// =============================================================================

#[rstest]
#[case(2, "0x455955a54e9c9357e2eb5aeb7f3775a04e442fe4dc558c9c8a5307794f970cdc")]
#[case(4, "0x67228555c18670df8c0c28dd70588af91503952193ff4a59a13252a177cf0b33")]
#[case(8, "0x6b6b4be58280d2cc3207c326d469f91670004d1ba079523d0440f2e0c15730d4")]
#[case(11, "0x36f396c0ba366e6b48880a020ae944e08bfb32fa4fdb28ae1175dae9f73f42a9")]
fn builtin_digest_of_counting_input(#[case] arity: usize, #[case] expected: &str) {
    let constants = builtin::load(arity).unwrap();
    let input: Vec<Fr> = (1..=arity as u64).map(Fr::from_u64).collect();
    assert_eq!(hash(&constants, &input), Fr::from_hex_be(expected).unwrap());
}

#[test]
fn builtin_arity_two_digests() {
    let constants = builtin::load(2).unwrap();
    assert_eq!(
        hash(&constants, &[Fr::from_u64(1), Fr::from_u64(2)]).to_hex(),
        "dc0c974f7907538a9c8c55dce42f444ea075377feb5aebe257939c4ea5555945"
    );
    assert_eq!(
        hash(&constants, &[Fr::ZERO, Fr::ZERO]).to_hex(),
        "e7f9652a9328a3b72525b4b88b86ade0af86df8943c37e2eebfaffa954002056"
    );
}

#[rstest]
#[case(2, 3)]
#[case(4, 5)]
#[case(8, 9)]
#[case(11, 12)]
fn builtin_shapes(#[case] arity: usize, #[case] width: usize) {
    let constants = builtin::load(arity).unwrap();
    let inst = builtin::instance(arity).unwrap();
    assert_eq!(constants.width(), width);
    assert_eq!(constants.sparse_matrices().len(), inst.partial_rounds);
    assert_eq!(
        constants.round_constants().len(),
        2 * inst.full_rounds_half * width + inst.partial_rounds
    );
    assert_eq!(constants.domain_tag(), Fr::from_u64((1 << arity) - 1));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[case(16)]
fn load_rejects_unsupported_arity(#[case] arity: usize) {
    assert_eq!(
        Poseidon::load(arity).unwrap_err(),
        ErrorCode::UnsupportedArity(arity)
    );
}

#[test]
fn load_is_cached() {
    let a = builtin::load(4).unwrap();
    let b = builtin::load(4).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

// =============================================================================
// Create and parameter files
// =============================================================================

#[rstest]
fn create_from_exported_constants_reproduces_load(
    #[values(2, 4, 8, 11)] arity: usize,
) {
    let loaded = builtin::load(arity).unwrap();
    let created = Poseidon::create(
        loaded.arity(),
        loaded.alpha(),
        loaded.full_rounds_half(),
        loaded.partial_rounds(),
        loaded.round_constants(),
        loaded.mds_matrix().as_flat(),
        loaded.non_sparse_matrix().as_flat(),
        &loaded.sparse_matrices_flat(),
        loaded.domain_tag(),
    )
    .unwrap();

    let input: Vec<Fr> = (0..arity as u64).map(|i| Fr::from_u64(i * 31 + 7)).collect();
    assert_eq!(
        hash(created.constants().unwrap(), &input),
        hash(&loaded, &input)
    );
}

#[test]
fn create_rejects_truncated_round_constants() {
    let loaded = builtin::load(2).unwrap();
    let rc = loaded.round_constants();
    let err = PoseidonConstants::create(
        2,
        5,
        4,
        57,
        &rc[..rc.len() - 1],
        loaded.mds_matrix().as_flat(),
        loaded.non_sparse_matrix().as_flat(),
        &loaded.sparse_matrices_flat(),
        loaded.domain_tag(),
    )
    .unwrap_err();
    assert!(matches!(err, ErrorCode::InvalidParameters(_)));
}

#[test]
fn create_rejects_dense_partial_round_matrix() {
    let loaded = builtin::load(2).unwrap();
    let mut sparse = loaded.sparse_matrices_flat();
    // entry (1, 2) lies in the identity block
    sparse[5] = Fr::from_u64(9);
    let err = PoseidonConstants::create(
        2,
        5,
        4,
        57,
        loaded.round_constants(),
        loaded.mds_matrix().as_flat(),
        loaded.non_sparse_matrix().as_flat(),
        &sparse,
        loaded.domain_tag(),
    )
    .unwrap_err();
    assert!(matches!(err, ErrorCode::InvalidParameters(_)));
}

#[test]
fn create_rejects_unsupported_arity_and_alpha() {
    let empty: [Fr; 0] = [];
    assert_eq!(
        PoseidonConstants::create(3, 5, 4, 0, &empty, &empty, &empty, &empty, Fr::ZERO)
            .unwrap_err(),
        ErrorCode::UnsupportedArity(3)
    );
    // 3 divides r - 1, so x^3 is not a permutation
    assert!(matches!(
        PoseidonConstants::generate(2, 3, 4, 57, Fr::ZERO),
        Err(ErrorCode::InvalidParameters(_))
    ));
}

#[test]
fn parameter_file_roundtrip_preserves_digests() {
    let loaded = builtin::load(4).unwrap();
    let json = ParameterFile::from_constants(&loaded).to_json().unwrap();
    let imported = ParameterFile::from_json(&json)
        .unwrap()
        .into_constants()
        .unwrap();

    assert_eq!(&imported, loaded.as_ref());
    let input = [Fr::from_u64(5); 4];
    assert_eq!(hash(&imported, &input), hash(&loaded, &input));
}

// =============================================================================
// Sponge behaviour
// =============================================================================

#[test]
fn incremental_absorb_matches_one_shot() {
    let constants = builtin::load(2).unwrap();
    let input: Vec<Fr> = (0..7).map(Fr::from_u64).collect();

    let mut sponge = Sponge::full_rate(&constants);
    for &x in &input[..3] {
        sponge.absorb_one(x);
    }
    sponge.absorb(&input[3..]);

    assert_eq!(sponge.squeeze(1).unwrap()[0], hash(&constants, &input));
}

#[test]
fn padding_modes_differ() {
    let constants = builtin::load(4).unwrap();
    let input = [Fr::ONE, Fr::ONE];

    let zeros = Sponge::new(&constants, 4, Padding::Zeros).unwrap();
    let tagged = Sponge::new(&constants, 4, Padding::LengthTagged).unwrap();

    let mut a = zeros.clone();
    a.absorb(&input);
    let mut b = tagged.clone();
    b.absorb(&input);
    assert_ne!(a.squeeze(1).unwrap(), b.squeeze(1).unwrap());

    // trailing zeros only change the digest when the length is tagged
    let mut a2 = zeros;
    a2.absorb(&[Fr::ONE, Fr::ONE, Fr::ZERO]);
    let mut a1 = Sponge::new(&constants, 4, Padding::Zeros).unwrap();
    a1.absorb(&input);
    assert_eq!(a1.squeeze(1).unwrap(), a2.squeeze(1).unwrap());

    let mut b2 = tagged;
    b2.absorb(&[Fr::ONE, Fr::ONE, Fr::ZERO]);
    let mut b1 = Sponge::new(&constants, 4, Padding::LengthTagged).unwrap();
    b1.absorb(&input);
    assert_ne!(b1.squeeze(1).unwrap(), b2.squeeze(1).unwrap());
}

#[test]
fn squeeze_beyond_width_fails() {
    let constants = builtin::load(2).unwrap();
    assert!(matches!(
        hash_n(&constants, &[Fr::ONE], 4),
        Err(ErrorCode::InvalidRateConfiguration(_))
    ));
}

#[test]
fn all_supported_arities_have_builtins() {
    for arity in SUPPORTED_ARITIES {
        assert!(Poseidon::load(arity).is_ok(), "arity {}", arity);
    }
}
