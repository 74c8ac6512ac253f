//! Square matrices over Fr and the sparse partial-round form.
//!
//! The partial rounds only push one state element through the S-box, so the
//! MDS multiplication can be rewritten as a chain of sparse matrices
//! `[[d, r^T], [c, I]]` plus one dense matrix applied before the chain.
//! Applying a sparse matrix costs `O(width)` instead of `O(width^2)`.

use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;

/// Dense square matrix, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    entries: Vec<Fr>,
}

impl Matrix {
    /// Build from a flat row-major buffer of `size * size` entries.
    pub fn from_flat(size: usize, entries: &[Fr]) -> PoseidonResult<Self> {
        if entries.len() != size * size {
            return Err(ErrorCode::InvalidParameters(format!(
                "matrix of size {} needs {} entries, got {}",
                size,
                size * size,
                entries.len()
            )));
        }
        Ok(Self {
            size,
            entries: entries.to_vec(),
        })
    }

    /// Identity matrix.
    pub fn identity(size: usize) -> Self {
        let mut entries = vec![Fr::ZERO; size * size];
        for i in 0..size {
            entries[i * size + i] = Fr::ONE;
        }
        Self { size, entries }
    }

    /// Cauchy matrix `M[i][j] = 1 / (x_i + y_j)`; `None` if any sum is zero.
    pub(crate) fn cauchy(xs: &[Fr], ys: &[Fr]) -> Option<Self> {
        let size = xs.len();
        let mut entries = Vec::with_capacity(size * size);
        for &x in xs {
            for &y in ys {
                entries.push((x + y).invert()?);
            }
        }
        Some(Self { size, entries })
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Fr {
        self.entries[i * self.size + j]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[Fr] {
        &self.entries[i * self.size..(i + 1) * self.size]
    }

    /// Row-major entries.
    pub fn as_flat(&self) -> &[Fr] {
        &self.entries
    }

    /// `out = self * state`
    #[inline]
    pub fn apply(&self, state: &[Fr], out: &mut [Fr]) {
        for (i, slot) in out.iter_mut().enumerate().take(self.size) {
            *slot = self
                .row(i)
                .iter()
                .zip(state)
                .fold(Fr::ZERO, |acc, (&m, &s)| acc + m * s);
        }
    }

    /// Matrix product `self * rhs`.
    pub fn mul(&self, rhs: &Matrix) -> Matrix {
        let n = self.size;
        let mut entries = vec![Fr::ZERO; n * n];
        for i in 0..n {
            for k in 0..n {
                let a = self.get(i, k);
                if a.is_zero() {
                    continue;
                }
                for j in 0..n {
                    entries[i * n + j] += a * rhs.get(k, j);
                }
            }
        }
        Matrix { size: n, entries }
    }

    /// The lower-right `(size - 1) x (size - 1)` block.
    fn minor(&self) -> Matrix {
        let n = self.size - 1;
        let mut entries = Vec::with_capacity(n * n);
        for i in 1..self.size {
            entries.extend_from_slice(&self.row(i)[1..]);
        }
        Matrix { size: n, entries }
    }

    /// `[[1, 0], [0, block]]`
    fn embed_minor(block: &Matrix) -> Matrix {
        let n = block.size + 1;
        let mut entries = vec![Fr::ZERO; n * n];
        entries[0] = Fr::ONE;
        for i in 0..block.size {
            entries[(i + 1) * n + 1..(i + 2) * n].copy_from_slice(block.row(i));
        }
        Matrix { size: n, entries }
    }

    /// Inverse by Gauss-Jordan elimination; `None` if singular.
    pub fn invert(&self) -> Option<Matrix> {
        let n = self.size;
        let mut work = self.entries.clone();
        let mut inv = Matrix::identity(n).entries;

        for col in 0..n {
            let pivot = (col..n).find(|&r| !work[r * n + col].is_zero())?;
            if pivot != col {
                for j in 0..n {
                    work.swap(pivot * n + j, col * n + j);
                    inv.swap(pivot * n + j, col * n + j);
                }
            }

            let scale = work[col * n + col].invert()?;
            for j in 0..n {
                work[col * n + j] = work[col * n + j] * scale;
                inv[col * n + j] = inv[col * n + j] * scale;
            }

            for r in 0..n {
                let factor = work[r * n + col];
                if r == col || factor.is_zero() {
                    continue;
                }
                for j in 0..n {
                    work[r * n + j] = work[r * n + j] - factor * work[col * n + j];
                    inv[r * n + j] = inv[r * n + j] - factor * inv[col * n + j];
                }
            }
        }

        Some(Matrix {
            size: n,
            entries: inv,
        })
    }
}

/// Sparse partial-round matrix `[[diag, row^T], [col, I]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseMatrix {
    diag: Fr,
    row: Vec<Fr>,
    col: Vec<Fr>,
}

impl SparseMatrix {
    /// Compress a dense matrix, checking that its lower-right block is the identity.
    pub fn from_matrix(m: &Matrix) -> PoseidonResult<Self> {
        let n = m.size();
        if n < 2 {
            return Err(ErrorCode::InvalidParameters(
                "sparse matrix needs width >= 2".to_string(),
            ));
        }
        for i in 1..n {
            for j in 1..n {
                let expected = if i == j { Fr::ONE } else { Fr::ZERO };
                if m.get(i, j) != expected {
                    return Err(ErrorCode::InvalidParameters(format!(
                        "sparse matrix entry ({}, {}) breaks the identity block",
                        i, j
                    )));
                }
            }
        }
        Ok(Self {
            diag: m.get(0, 0),
            row: m.row(0)[1..].to_vec(),
            col: (1..n).map(|i| m.get(i, 0)).collect(),
        })
    }

    /// Expand back into a dense matrix.
    pub fn to_matrix(&self) -> Matrix {
        let n = self.row.len() + 1;
        let mut m = Matrix::identity(n);
        m.entries[0] = self.diag;
        m.entries[1..n].copy_from_slice(&self.row);
        for (i, &c) in self.col.iter().enumerate() {
            m.entries[(i + 1) * n] = c;
        }
        m
    }

    /// Width of the state this matrix acts on.
    pub fn size(&self) -> usize {
        self.row.len() + 1
    }

    /// Multiply `state` in place.
    #[inline]
    pub fn apply(&self, state: &mut [Fr]) {
        let s0 = state[0];
        let mut first = self.diag * s0;
        for ((slot, &r), &c) in state[1..].iter_mut().zip(&self.row).zip(&self.col) {
            first += r * *slot;
            *slot += c * s0;
        }
        state[0] = first;
    }
}

/// Factor the partial-round MDS multiplications into sparse form.
///
/// Returns the dense matrix that replaces the MDS in the last full round
/// before the partial rounds, and one sparse matrix per partial round, in
/// round order. `None` if a required minor is singular.
pub(crate) fn factor_partial_rounds(
    mds: &Matrix,
    partial_rounds: usize,
) -> Option<(Matrix, Vec<SparseMatrix>)> {
    let mut acc = mds.clone();
    let mut sparse = Vec::with_capacity(partial_rounds);

    for _ in 0..partial_rounds {
        let hat = acc.minor();
        let hat_inv = hat.invert()?;

        let head = &acc.row(0)[1..];
        let row = (0..hat.size())
            .map(|j| {
                head.iter()
                    .enumerate()
                    .fold(Fr::ZERO, |sum, (k, &h)| sum + h * hat_inv.get(k, j))
            })
            .collect();
        let col = (1..acc.size()).map(|i| acc.get(i, 0)).collect();

        sparse.push(SparseMatrix {
            diag: acc.get(0, 0),
            row,
            col,
        });
        acc = Matrix::embed_minor(&hat).mul(mds);
    }

    // built last round first
    sparse.reverse();
    Some((acc, sparse))
}
