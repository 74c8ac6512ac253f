//! JSON representation of a parameter set.
//!
//! Field elements are stored as 64-char little-endian hex strings. Importing
//! goes through [`PoseidonConstants::create`], so a file is validated exactly
//! like caller-supplied buffers.

use super::PoseidonConstants;
use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;
use serde::{Deserialize, Serialize};

/// Serializable parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFile {
    /// Format version, currently "1".
    pub version: String,
    /// Inputs per permutation.
    pub arity: usize,
    /// S-box exponent.
    pub alpha: u64,
    /// Full rounds on each side of the partial rounds.
    pub full_rounds_half: usize,
    /// Number of partial rounds.
    pub partial_rounds: usize,
    /// Optimized round constants.
    pub round_constants: Vec<Fr>,
    /// MDS matrix, row-major.
    pub mds_matrix: Vec<Fr>,
    /// Pre-sparse matrix, row-major.
    pub non_sparse_matrix: Vec<Fr>,
    /// Sparse matrices, each in full row-major form.
    pub sparse_matrices: Vec<Fr>,
    /// Domain tag.
    pub domain_tag: Fr,
}

const FORMAT_VERSION: &str = "1";

impl ParameterFile {
    /// Snapshot a parameter set.
    pub fn from_constants(constants: &PoseidonConstants) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            arity: constants.arity(),
            alpha: constants.alpha(),
            full_rounds_half: constants.full_rounds_half(),
            partial_rounds: constants.partial_rounds(),
            round_constants: constants.round_constants().to_vec(),
            mds_matrix: constants.mds_matrix().as_flat().to_vec(),
            non_sparse_matrix: constants.non_sparse_matrix().as_flat().to_vec(),
            sparse_matrices: constants.sparse_matrices_flat(),
            domain_tag: constants.domain_tag(),
        }
    }

    /// Validate and convert into a parameter set.
    pub fn into_constants(self) -> PoseidonResult<PoseidonConstants> {
        if self.version != FORMAT_VERSION {
            return Err(ErrorCode::InvalidParameters(format!(
                "unknown parameter file version '{}'",
                self.version
            )));
        }
        PoseidonConstants::create(
            self.arity,
            self.alpha,
            self.full_rounds_half,
            self.partial_rounds,
            &self.round_constants,
            &self.mds_matrix,
            &self.non_sparse_matrix,
            &self.sparse_matrices,
            self.domain_tag,
        )
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> PoseidonResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ErrorCode::InvalidParameters(e.to_string()))
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> PoseidonResult<Self> {
        serde_json::from_str(json).map_err(|e| ErrorCode::InvalidParameters(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::builtin;

    #[test]
    fn test_json_roundtrip() {
        let constants = builtin::load(2).unwrap();
        let json = ParameterFile::from_constants(&constants).to_json().unwrap();
        let restored = ParameterFile::from_json(&json)
            .unwrap()
            .into_constants()
            .unwrap();
        assert_eq!(&restored, constants.as_ref());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut file = ParameterFile::from_constants(&builtin::load(2).unwrap());
        file.version = "2".to_string();
        assert!(matches!(
            file.into_constants(),
            Err(ErrorCode::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_bad_hex() {
        let err = ParameterFile::from_json(r#"{"version":"1","domain_tag":"zz"}"#).unwrap_err();
        assert_eq!(err.code(), 101);
    }
}
