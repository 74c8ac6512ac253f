//! Built-in parameter sets.
//!
//! Built-ins are generated on first use and cached for the life of the
//! process. All use `alpha = 5` and 8 full rounds; the domain tag is
//! `2^arity - 1`, the tag used for Merkle-tree style hashing.

use super::PoseidonConstants;
use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Round configuration of a built-in instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinInstance {
    /// Inputs per permutation.
    pub arity: usize,
    /// S-box exponent.
    pub alpha: u64,
    /// Full rounds on each side of the partial rounds.
    pub full_rounds_half: usize,
    /// Number of partial rounds.
    pub partial_rounds: usize,
}

impl BuiltinInstance {
    /// Domain tag for this instance.
    pub fn domain_tag(&self) -> Fr {
        Fr::from_u64((1u64 << self.arity) - 1)
    }
}

/// Every built-in instance, by arity.
///
/// Arity 2 is the published reference instance (57 partial rounds). The
/// wider instances carry more partial rounds than the 128-bit minimum for
/// their width, so their digests differ from parameter sets that use the
/// minimal counts.
pub const BUILTIN_INSTANCES: [BuiltinInstance; 4] = [
    BuiltinInstance { arity: 2, alpha: 5, full_rounds_half: 4, partial_rounds: 57 },
    BuiltinInstance { arity: 4, alpha: 5, full_rounds_half: 4, partial_rounds: 60 },
    BuiltinInstance { arity: 8, alpha: 5, full_rounds_half: 4, partial_rounds: 63 },
    BuiltinInstance { arity: 11, alpha: 5, full_rounds_half: 4, partial_rounds: 63 },
];

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY: OnceLock<Arc<PoseidonConstants>> = OnceLock::new();
static CACHE: [OnceLock<Arc<PoseidonConstants>>; BUILTIN_INSTANCES.len()] =
    [EMPTY; BUILTIN_INSTANCES.len()];

/// Look up the built-in round configuration for an arity.
pub fn instance(arity: usize) -> PoseidonResult<BuiltinInstance> {
    BUILTIN_INSTANCES
        .iter()
        .find(|i| i.arity == arity)
        .copied()
        .ok_or(ErrorCode::UnsupportedArity(arity))
}

/// Resolve the built-in parameter set for an arity.
pub fn load(arity: usize) -> PoseidonResult<Arc<PoseidonConstants>> {
    let index = BUILTIN_INSTANCES
        .iter()
        .position(|i| i.arity == arity)
        .ok_or(ErrorCode::UnsupportedArity(arity))?;
    let cell = &CACHE[index];

    if let Some(constants) = cell.get() {
        return Ok(Arc::clone(constants));
    }

    let inst = BUILTIN_INSTANCES[index];
    debug!(arity, "generating built-in parameters");
    let generated = Arc::new(PoseidonConstants::generate(
        inst.arity,
        inst.alpha,
        inst.full_rounds_half,
        inst.partial_rounds,
        inst.domain_tag(),
    )?);

    Ok(Arc::clone(cell.get_or_init(|| generated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_cached() {
        let a = load(2).unwrap();
        let b = load(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_load_unknown_arity() {
        assert_eq!(load(5).unwrap_err(), ErrorCode::UnsupportedArity(5));
        assert_eq!(instance(0).unwrap_err(), ErrorCode::UnsupportedArity(0));
    }

    #[test]
    fn test_round_counts_cover_security_bound() {
        // minimum partial rounds for 128-bit security with 8 full rounds, alpha 5
        let minimum = [(2, 56), (4, 56), (8, 57), (11, 57)];
        for (arity, min_partial) in minimum {
            let inst = instance(arity).unwrap();
            assert_eq!(inst.full_rounds_half, 4);
            assert_eq!(inst.alpha, 5);
            assert!(inst.partial_rounds >= min_partial, "arity {}", arity);
        }
        assert_eq!(instance(2).unwrap().partial_rounds, 57);
    }

    #[test]
    fn test_domain_tags() {
        assert_eq!(instance(2).unwrap().domain_tag(), Fr::from_u64(3));
        assert_eq!(instance(11).unwrap().domain_tag(), Fr::from_u64(2047));
    }
}
