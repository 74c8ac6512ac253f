//! Grain LFSR used by the Poseidon reference parameter generator.
//!
//! The 80-bit register is seeded from the instance description (field type,
//! S-box type, field size, width, round counts) so every instance gets its
//! own deterministic stream. Output bits pass through the self-shrinking
//! filter: bits are drawn in pairs and the second is emitted only when the
//! first is one.

use super::matrix::Matrix;
use crate::field::{Fr, MODULUS_BITS};

const STATE_BITS: usize = 80;
const WARMUP_STEPS: usize = 160;

/// Grain LFSR state.
pub(crate) struct Grain {
    bits: [bool; STATE_BITS],
    head: usize,
}

impl Grain {
    /// Seed the register for a prime-field, `x^alpha` S-box instance.
    pub(crate) fn new(width: usize, full_rounds: usize, partial_rounds: usize) -> Self {
        let mut bits = [false; STATE_BITS];
        let mut pos = 0;
        let mut push = |value: u64, len: usize| {
            for i in (0..len).rev() {
                bits[pos] = (value >> i) & 1 == 1;
                pos += 1;
            }
        };

        // field: prime
        push(1, 2);
        // s-box: x^alpha
        push(0, 4);
        push(MODULUS_BITS as u64, 12);
        push(width as u64, 12);
        push(full_rounds as u64, 10);
        push(partial_rounds as u64, 10);
        push((1 << 30) - 1, 30);

        let mut grain = Self { bits, head: 0 };
        for _ in 0..WARMUP_STEPS {
            grain.step();
        }
        grain
    }

    /// Clock the register once and return the new bit.
    fn step(&mut self) -> bool {
        let at = |k: usize| self.bits[(self.head + k) % STATE_BITS];
        let new_bit = at(62) ^ at(51) ^ at(38) ^ at(23) ^ at(13) ^ at(0);
        self.bits[self.head] = new_bit;
        self.head = (self.head + 1) % STATE_BITS;
        new_bit
    }

    fn next_bit(&mut self) -> bool {
        loop {
            let selector = self.step();
            let candidate = self.step();
            if selector {
                return candidate;
            }
        }
    }

    /// Next `MODULUS_BITS`-bit sample as little-endian bytes.
    fn next_sample(&mut self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for i in (0..MODULUS_BITS as usize).rev() {
            if self.next_bit() {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        bytes
    }

    /// Next field element, rejecting samples that are not below the modulus.
    pub(crate) fn next_field_element(&mut self) -> Fr {
        loop {
            if let Ok(fr) = Fr::from_bytes_le(&self.next_sample()) {
                return fr;
            }
        }
    }

    /// Next field element, reducing the sample modulo the field modulus.
    pub(crate) fn next_field_element_reduced(&mut self) -> Fr {
        Fr::from_bytes_le_reduced(&self.next_sample())
    }
}

/// Round constants and MDS matrix of a textbook (unoptimized) instance.
pub(crate) struct StandardConstants {
    /// `round_constants[round][slot]`
    pub(crate) round_constants: Vec<Vec<Fr>>,
    pub(crate) mds: Matrix,
}

/// Derive the textbook constants for an instance from the Grain stream.
pub(crate) fn generate(width: usize, full_rounds: usize, partial_rounds: usize) -> StandardConstants {
    let mut grain = Grain::new(width, full_rounds, partial_rounds);

    let round_constants = (0..full_rounds + partial_rounds)
        .map(|_| (0..width).map(|_| grain.next_field_element()).collect())
        .collect();

    let mds = loop {
        let samples: Vec<Fr> = (0..2 * width)
            .map(|_| grain.next_field_element_reduced())
            .collect();
        if has_duplicates(&samples) {
            continue;
        }
        let (xs, ys) = samples.split_at(width);
        if let Some(mds) = Matrix::cauchy(xs, ys) {
            break mds;
        }
    };

    StandardConstants {
        round_constants,
        mds,
    }
}

fn has_duplicates(samples: &[Fr]) -> bool {
    samples
        .iter()
        .enumerate()
        .any(|(i, a)| samples[i + 1..].contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_round_constant_for_width_3() {
        let constants = generate(3, 8, 57);
        assert_eq!(
            constants.round_constants[0][0].to_hex(),
            "80089150f2d14095e0421dc83b2c4affa94cae7dcc0549f77b1aaf3e72fa4f6c"
        );
        assert_eq!(
            constants.mds.get(0, 0).to_hex(),
            "cdcf2a3fc91367761374d26b38b4a768f6ef552b2fe100b57c4dfe026c5d953d"
        );
    }

    #[test]
    fn test_stream_depends_on_instance() {
        let mut a = Grain::new(3, 8, 57);
        let mut b = Grain::new(5, 8, 60);
        assert_ne!(a.next_field_element(), b.next_field_element());
    }

    #[test]
    fn test_shapes() {
        let constants = generate(5, 8, 60);
        assert_eq!(constants.round_constants.len(), 68);
        assert!(constants.round_constants.iter().all(|rc| rc.len() == 5));
        assert_eq!(constants.mds.size(), 5);
    }
}
