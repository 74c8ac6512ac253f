//! Poseidon permutation and sponge construction.
//!
//! Both are parameterized by a [`PoseidonConstants`](crate::params::PoseidonConstants)
//! value, so the same code serves every supported arity.

mod permute;
mod sponge;

pub use permute::{permute, permute_with_trace};
pub use sponge::{hash, hash_n, Padding, Sponge};
