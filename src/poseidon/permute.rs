//! Poseidon permutation implementation.
//!
//! The permutation runs `full_rounds_half` full rounds, then the partial
//! rounds, then `full_rounds_half` full rounds again:
//!
//! - full round: add `width` constants, S-box every element, MDS multiply
//! - partial round: add one constant to element 0, S-box element 0, sparse multiply
//!
//! The last full round before the partial block multiplies by the
//! pre-sparse matrix instead of the MDS, which absorbs the dense part of the
//! factored partial-round matrices.

use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;
use crate::params::{PoseidonConstants, MAX_WIDTH};

/// Apply the S-box to every element.
#[inline]
fn sbox_full(state: &mut [Fr], alpha: u64) {
    for x in state.iter_mut() {
        *x = x.pow(alpha);
    }
}

/// Add round constants to state.
#[inline]
fn add_round_constants(state: &mut [Fr], constants: &[Fr]) {
    for (x, &c) in state.iter_mut().zip(constants) {
        *x += c;
    }
}

/// Round-by-round driver shared by the plain and traced permutations.
fn run(constants: &PoseidonConstants, state: &mut [Fr], mut on_round: impl FnMut(&[Fr])) {
    let width = constants.width();
    let alpha = constants.alpha();
    let half = constants.full_rounds_half();
    let rc = constants.round_constants();
    let mut scratch = [Fr::ZERO; MAX_WIDTH];
    let scratch = &mut scratch[..width];

    // First half of full rounds
    for round in 0..half {
        add_round_constants(state, &rc[round * width..(round + 1) * width]);
        sbox_full(state, alpha);
        let matrix = if round + 1 == half {
            constants.non_sparse_matrix()
        } else {
            constants.mds_matrix()
        };
        matrix.apply(state, scratch);
        state.copy_from_slice(scratch);
        on_round(state);
    }

    // Partial rounds
    let offset = half * width;
    for (round, sparse) in constants.sparse_matrices().iter().enumerate() {
        state[0] = (state[0] + rc[offset + round]).pow(alpha);
        sparse.apply(state);
        on_round(state);
    }

    // Second half of full rounds
    let offset = offset + constants.partial_rounds();
    for round in 0..half {
        let start = offset + round * width;
        add_round_constants(state, &rc[start..start + width]);
        sbox_full(state, alpha);
        constants.mds_matrix().apply(state, scratch);
        state.copy_from_slice(scratch);
        on_round(state);
    }
}

/// Permute a state in place without checking its length.
#[inline]
pub(crate) fn permute_in_place(constants: &PoseidonConstants, state: &mut [Fr]) {
    debug_assert_eq!(state.len(), constants.width());
    run(constants, state, |_| {});
}

fn check_width(constants: &PoseidonConstants, state: &[Fr]) -> PoseidonResult<()> {
    if state.len() != constants.width() {
        return Err(ErrorCode::ShapeMismatch(format!(
            "state has {} elements, width is {}",
            state.len(),
            constants.width()
        )));
    }
    Ok(())
}

/// Complete Poseidon permutation of one state vector.
pub fn permute(constants: &PoseidonConstants, state: &mut [Fr]) -> PoseidonResult<()> {
    check_width(constants, state)?;
    permute_in_place(constants, state);
    Ok(())
}

/// Poseidon permutation with trace output for debugging.
///
/// Returns the state after every round, full and partial, in order.
pub fn permute_with_trace(
    constants: &PoseidonConstants,
    state: &mut [Fr],
) -> PoseidonResult<Vec<Vec<Fr>>> {
    check_width(constants, state)?;
    let mut traces = Vec::with_capacity(constants.total_rounds());
    run(constants, state, |s| traces.push(s.to_vec()));
    Ok(traces)
}
