//! Error handling for the Poseidon engine.
//!
//! Every fallible operation returns [`PoseidonResult`]. Codes are stable so
//! callers marshaling errors across a language boundary can match on
//! [`ErrorCode::code`] instead of the display string.

use thiserror::Error;

/// All error codes surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ErrorCode {
    /// No parameters exist for the requested arity (code 100)
    #[error("unsupported arity: {0}")]
    UnsupportedArity(usize),

    /// Caller-supplied constants have the wrong shape or value (code 101)
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Input or output rate violates the width constraints (code 102)
    #[error("invalid rate configuration: {0}")]
    InvalidRateConfiguration(String),

    /// Batch buffers are inconsistent with the requested batch shape (code 103)
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Operation attempted on a released instance handle (code 104)
    #[error("instance handle used after release")]
    UseAfterRelease,

    /// Compute or transfer failed after launch (code 105)
    #[error("execution failure: {0}")]
    ExecutionFailure(String),

    /// Bytes do not encode a canonical field element (code 200)
    #[error("non-canonical field element: {0}")]
    NonCanonicalFr(String),

    /// Hex string could not be decoded (code 201)
    #[error("invalid hex encoding")]
    InvalidHex,

    /// Encoded value has the wrong length (code 202)
    #[error("wrong length: expected {0}, got {1}")]
    WrongLength(String, u64),
}

impl ErrorCode {
    /// Get the numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::UnsupportedArity(_) => 100,
            ErrorCode::InvalidParameters(_) => 101,
            ErrorCode::InvalidRateConfiguration(_) => 102,
            ErrorCode::ShapeMismatch(_) => 103,
            ErrorCode::UseAfterRelease => 104,
            ErrorCode::ExecutionFailure(_) => 105,
            ErrorCode::NonCanonicalFr(_) => 200,
            ErrorCode::InvalidHex => 201,
            ErrorCode::WrongLength(_, _) => 202,
        }
    }

    /// Get the error name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::UnsupportedArity(_) => "UnsupportedArity",
            ErrorCode::InvalidParameters(_) => "InvalidParameters",
            ErrorCode::InvalidRateConfiguration(_) => "InvalidRateConfiguration",
            ErrorCode::ShapeMismatch(_) => "ShapeMismatch",
            ErrorCode::UseAfterRelease => "UseAfterRelease",
            ErrorCode::ExecutionFailure(_) => "ExecutionFailure",
            ErrorCode::NonCanonicalFr(_) => "NonCanonicalFr",
            ErrorCode::InvalidHex => "InvalidHex",
            ErrorCode::WrongLength(_, _) => "WrongLength",
        }
    }
}

/// Result type for engine operations.
pub type PoseidonResult<T> = Result<T, ErrorCode>;
