//! Poseidon sponge construction.
//!
//! The state starts as all zeros with the domain tag in the last slot (the
//! capacity). Input elements are added into the first `rate` slots; a full
//! block is permuted only when the next element arrives, so absorbing exactly
//! one block and squeezing costs a single permutation. Squeezing reads the
//! first `n` slots, `n <= width`.

use super::permute::permute_in_place;
use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;
use crate::params::{PoseidonConstants, MAX_WIDTH};
use serde::{Deserialize, Serialize};

/// How the final block is padded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Padding {
    /// Unused rate slots stay zero.
    ///
    /// Inputs that differ only by trailing zeros collide unless callers keep
    /// the block length fixed per domain tag.
    #[default]
    Zeros,
    /// Zero padding, plus `len * 2^64` added to the capacity slot before the
    /// final permutation, `len` being the number of absorbed elements.
    LengthTagged,
}

/// Sponge state for incremental hashing.
#[derive(Debug, Clone)]
pub struct Sponge<'a> {
    constants: &'a PoseidonConstants,
    state: [Fr; MAX_WIDTH],
    rate: usize,
    pos: usize,
    absorbed: u64,
    padding: Padding,
}

impl<'a> Sponge<'a> {
    /// Create a sponge absorbing `rate` elements per permutation.
    pub fn new(constants: &'a PoseidonConstants, rate: usize, padding: Padding) -> PoseidonResult<Self> {
        let width = constants.width();
        if rate == 0 || rate >= width {
            return Err(ErrorCode::InvalidRateConfiguration(format!(
                "rate must be in 1..={}, got {}",
                width - 1,
                rate
            )));
        }

        let mut state = [Fr::ZERO; MAX_WIDTH];
        state[width - 1] = constants.domain_tag();
        Ok(Self {
            constants,
            state,
            rate,
            pos: 0,
            absorbed: 0,
            padding,
        })
    }

    /// Sponge at full rate, `width - 1`, with zero padding.
    pub fn full_rate(constants: &'a PoseidonConstants) -> Self {
        let width = constants.width();
        let mut state = [Fr::ZERO; MAX_WIDTH];
        state[width - 1] = constants.domain_tag();
        Self {
            constants,
            state,
            rate: width - 1,
            pos: 0,
            absorbed: 0,
            padding: Padding::Zeros,
        }
    }

    fn state_mut(&mut self) -> &mut [Fr] {
        let width = self.constants.width();
        &mut self.state[..width]
    }

    fn permute(&mut self) {
        let constants = self.constants;
        permute_in_place(constants, self.state_mut());
    }

    /// Absorb a single field element.
    pub fn absorb_one(&mut self, x: Fr) {
        if self.pos == self.rate {
            self.permute();
            self.pos = 0;
        }
        self.state[self.pos] += x;
        self.pos += 1;
        self.absorbed += 1;
    }

    /// Absorb multiple field elements.
    pub fn absorb(&mut self, elements: &[Fr]) {
        for &x in elements {
            self.absorb_one(x);
        }
    }

    fn finish(&mut self) {
        if self.padding == Padding::LengthTagged {
            let capacity = self.constants.width() - 1;
            self.state[capacity] += Fr::from_u64(self.absorbed) * Fr::TWO_POW_64;
        }
        self.permute();
    }

    /// Run the final permutation and write the first `out.len()` state elements.
    pub fn squeeze_into(mut self, out: &mut [Fr]) -> PoseidonResult<()> {
        let width = self.constants.width();
        if out.len() > width {
            return Err(ErrorCode::InvalidRateConfiguration(format!(
                "cannot squeeze {} elements from width {}",
                out.len(),
                width
            )));
        }
        self.finish();
        out.copy_from_slice(&self.state[..out.len()]);
        Ok(())
    }

    /// Run the final permutation and return the first `n` state elements.
    pub fn squeeze(self, n: usize) -> PoseidonResult<Vec<Fr>> {
        let mut out = vec![Fr::ZERO; n];
        self.squeeze_into(&mut out)?;
        Ok(out)
    }
}

/// Hash an array of field elements to a single field element.
pub fn hash(constants: &PoseidonConstants, elements: &[Fr]) -> Fr {
    let mut sponge = Sponge::full_rate(constants);
    sponge.absorb(elements);
    sponge.finish();
    sponge.state[0]
}

/// Hash an array of field elements to `n <= width` field elements.
pub fn hash_n(constants: &PoseidonConstants, elements: &[Fr], n: usize) -> PoseidonResult<Vec<Fr>> {
    let mut sponge = Sponge::full_rate(constants);
    sponge.absorb(elements);
    sponge.squeeze(n)
}
