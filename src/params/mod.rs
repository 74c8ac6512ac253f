//! Poseidon parameter sets.
//!
//! A [`PoseidonConstants`] value holds everything the permutation needs for
//! one arity: the MDS matrix, the pre-sparse ("non-sparse") matrix, one sparse
//! matrix per partial round, the optimized round constants and the domain tag.
//!
//! Parameter sets come from three places:
//!
//! - [`PoseidonConstants::create`] validates caller-supplied buffers
//! - [`PoseidonConstants::generate`] derives an instance from the Grain LFSR
//! - [`builtin::load`] returns the cached built-in set for an arity
//!
//! # Round constant layout
//!
//! Constants are stored flat in the order the permutation consumes them:
//! `full_rounds_half * width` for the first full half, one scalar per
//! partial round, then `full_rounds_half * width` for the second half.

pub mod builtin;
mod file;
pub(crate) mod grain;
mod matrix;

pub use file::ParameterFile;
pub use matrix::{Matrix, SparseMatrix};

use crate::error::{ErrorCode, PoseidonResult};
use crate::field::{modulus_minus_one_rem, Fr};
use tracing::{debug, instrument};

/// Arities accepted by [`PoseidonConstants::create`].
pub const SUPPORTED_ARITIES: [usize; 4] = [2, 4, 8, 11];

/// Largest state width of any supported arity.
pub const MAX_WIDTH: usize = 12;

/// Immutable constants for one Poseidon instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseidonConstants {
    arity: usize,
    alpha: u64,
    full_rounds_half: usize,
    partial_rounds: usize,
    round_constants: Vec<Fr>,
    mds_matrix: Matrix,
    non_sparse_matrix: Matrix,
    sparse_matrices: Vec<SparseMatrix>,
    domain_tag: Fr,
}

impl PoseidonConstants {
    /// Build a parameter set from caller-supplied constants.
    ///
    /// Matrices are flat row-major buffers: `mds_matrix` and
    /// `non_sparse_matrix` hold `width^2` entries, `sparse_matrices` holds
    /// `partial_rounds` full `width x width` matrices back to back.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        arity: usize,
        alpha: u64,
        full_rounds_half: usize,
        partial_rounds: usize,
        round_constants: &[Fr],
        mds_matrix: &[Fr],
        non_sparse_matrix: &[Fr],
        sparse_matrices: &[Fr],
        domain_tag: Fr,
    ) -> PoseidonResult<Self> {
        check_shape(arity, alpha, full_rounds_half)?;
        let width = arity + 1;

        let expected_constants = round_constants_len(width, full_rounds_half, partial_rounds);
        if round_constants.len() != expected_constants {
            return Err(ErrorCode::InvalidParameters(format!(
                "expected {} round constants, got {}",
                expected_constants,
                round_constants.len()
            )));
        }

        let mds_matrix = Matrix::from_flat(width, mds_matrix)?;
        let non_sparse_matrix = Matrix::from_flat(width, non_sparse_matrix)?;

        let block = width * width;
        if sparse_matrices.len() != partial_rounds * block {
            return Err(ErrorCode::InvalidParameters(format!(
                "expected {} sparse matrices of {} entries, got {} entries",
                partial_rounds,
                block,
                sparse_matrices.len()
            )));
        }
        let sparse_matrices = sparse_matrices
            .chunks_exact(block)
            .map(|chunk| Matrix::from_flat(width, chunk).and_then(|m| SparseMatrix::from_matrix(&m)))
            .collect::<PoseidonResult<Vec<_>>>()?;

        Ok(Self {
            arity,
            alpha,
            full_rounds_half,
            partial_rounds,
            round_constants: round_constants.to_vec(),
            mds_matrix,
            non_sparse_matrix,
            sparse_matrices,
            domain_tag,
        })
    }

    /// Derive a parameter set with the Poseidon reference generator.
    ///
    /// Round constants and the Cauchy MDS matrix come from the Grain LFSR;
    /// the partial rounds are then rewritten into sparse form.
    #[instrument(level = "debug", err)]
    pub fn generate(
        arity: usize,
        alpha: u64,
        full_rounds_half: usize,
        partial_rounds: usize,
        domain_tag: Fr,
    ) -> PoseidonResult<Self> {
        check_shape(arity, alpha, full_rounds_half)?;
        let width = arity + 1;

        let standard = grain::generate(width, 2 * full_rounds_half, partial_rounds);
        let (non_sparse_matrix, sparse_matrices) =
            matrix::factor_partial_rounds(&standard.mds, partial_rounds).ok_or_else(|| {
                ErrorCode::InvalidParameters("MDS minor is not invertible".to_string())
            })?;
        let round_constants = fold_round_constants(
            &standard.round_constants,
            &standard.mds,
            full_rounds_half,
            partial_rounds,
        );

        debug!(
            width,
            constants = round_constants.len(),
            "generated poseidon parameters"
        );

        Ok(Self {
            arity,
            alpha,
            full_rounds_half,
            partial_rounds,
            round_constants,
            mds_matrix: standard.mds,
            non_sparse_matrix,
            sparse_matrices,
            domain_tag,
        })
    }

    /// Number of input elements one permutation absorbs at full rate.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// State width, `arity + 1`.
    pub fn width(&self) -> usize {
        self.arity + 1
    }

    /// S-box exponent.
    pub fn alpha(&self) -> u64 {
        self.alpha
    }

    /// Full rounds on each side of the partial rounds.
    pub fn full_rounds_half(&self) -> usize {
        self.full_rounds_half
    }

    /// Number of partial rounds.
    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    /// Total rounds, full and partial.
    pub fn total_rounds(&self) -> usize {
        2 * self.full_rounds_half + self.partial_rounds
    }

    /// Optimized round constants, in permutation order.
    pub fn round_constants(&self) -> &[Fr] {
        &self.round_constants
    }

    /// MDS matrix used by full rounds.
    pub fn mds_matrix(&self) -> &Matrix {
        &self.mds_matrix
    }

    /// Matrix used by the last full round before the partial rounds.
    pub fn non_sparse_matrix(&self) -> &Matrix {
        &self.non_sparse_matrix
    }

    /// One sparse matrix per partial round.
    pub fn sparse_matrices(&self) -> &[SparseMatrix] {
        &self.sparse_matrices
    }

    /// Domain separation tag placed in the capacity slot.
    pub fn domain_tag(&self) -> Fr {
        self.domain_tag
    }

    /// Sparse matrices expanded to a flat buffer, as accepted by [`Self::create`].
    pub fn sparse_matrices_flat(&self) -> Vec<Fr> {
        self.sparse_matrices
            .iter()
            .flat_map(|s| s.to_matrix().as_flat().to_vec())
            .collect()
    }
}

fn round_constants_len(width: usize, full_rounds_half: usize, partial_rounds: usize) -> usize {
    2 * full_rounds_half * width + partial_rounds
}

fn check_shape(arity: usize, alpha: u64, full_rounds_half: usize) -> PoseidonResult<()> {
    if !SUPPORTED_ARITIES.contains(&arity) {
        return Err(ErrorCode::UnsupportedArity(arity));
    }
    if full_rounds_half == 0 {
        return Err(ErrorCode::InvalidParameters(
            "at least one full round per half is required".to_string(),
        ));
    }
    if !sbox_is_permutation(alpha) {
        return Err(ErrorCode::InvalidParameters(format!(
            "x^{} is not a permutation of the field",
            alpha
        )));
    }
    Ok(())
}

/// `x -> x^alpha` is a bijection iff `gcd(alpha, r - 1) = 1`.
fn sbox_is_permutation(alpha: u64) -> bool {
    if alpha < 3 {
        return false;
    }
    let (mut a, mut b) = (alpha, modulus_minus_one_rem(alpha));
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a == 1
}

/// Fold textbook round constants into the optimized layout.
///
/// In a partial round only slot 0 passes through the S-box, so the other
/// constants of that round can be pushed through the MDS into the next
/// round. The carry out of the last partial round lands in the first round
/// of the second full half.
fn fold_round_constants(
    standard: &[Vec<Fr>],
    mds: &Matrix,
    full_rounds_half: usize,
    partial_rounds: usize,
) -> Vec<Fr> {
    let width = mds.size();
    let mut folded = Vec::with_capacity(round_constants_len(width, full_rounds_half, partial_rounds));

    for rc in &standard[..full_rounds_half] {
        folded.extend_from_slice(rc);
    }

    let mut carry = vec![Fr::ZERO; width];
    let mut rest = vec![Fr::ZERO; width];
    for rc in &standard[full_rounds_half..full_rounds_half + partial_rounds] {
        for ((r, &c), &k) in rest.iter_mut().zip(rc).zip(&carry) {
            *r = c + k;
        }
        folded.push(rest[0]);
        rest[0] = Fr::ZERO;
        mds.apply(&rest, &mut carry);
    }

    for (round, rc) in standard[full_rounds_half + partial_rounds..].iter().enumerate() {
        if round == 0 {
            folded.extend(rc.iter().zip(&carry).map(|(&c, &k)| c + k));
        } else {
            folded.extend_from_slice(rc);
        }
    }

    folded
}
